use crate::logic::board::{
    sq_file, sq_rank, Board, Color, Piece, PieceType, BISHOP_DIRS, KING_DIRS, KNIGHT_DIRS,
    ROOK_DIRS,
};

const fn file_of(sq: i32) -> i32 {
    sq & 7
}

/// True if any piece of `by` attacks `sq`. Checks pawns, knights, king
/// steps, then walks diagonal and straight rays to the first blocker.
#[must_use]
pub fn is_attacked(board: &Board, sq: usize, by: Color) -> bool {
    let pawn = Some(Piece::new(PieceType::Pawn, by));
    match by {
        Color::White => {
            if sq_rank(sq) > 0 {
                if sq_file(sq) > 0 && board.grid[sq - 9] == pawn {
                    return true;
                }
                if sq_file(sq) < 7 && board.grid[sq - 7] == pawn {
                    return true;
                }
            }
        }
        Color::Black => {
            if sq_rank(sq) < 7 {
                if sq_file(sq) > 0 && board.grid[sq + 7] == pawn {
                    return true;
                }
                if sq_file(sq) < 7 && board.grid[sq + 9] == pawn {
                    return true;
                }
            }
        }
    }

    let knight = Some(Piece::new(PieceType::Knight, by));
    for d in KNIGHT_DIRS {
        let to = sq as i32 + d;
        if (0..64).contains(&to)
            && (file_of(to) - file_of(sq as i32)).abs() <= 2
            && board.grid[to as usize] == knight
        {
            return true;
        }
    }

    let king = Some(Piece::new(PieceType::King, by));
    for d in KING_DIRS {
        let to = sq as i32 + d;
        if (0..64).contains(&to)
            && (file_of(to) - file_of(sq as i32)).abs() <= 1
            && board.grid[to as usize] == king
        {
            return true;
        }
    }

    for d in BISHOP_DIRS {
        let mut to = sq as i32 + d;
        while (0..64).contains(&to) {
            if (file_of(to) - file_of(to - d)).abs() != 1 {
                break; // wrapped
            }
            if let Some(p) = board.grid[to as usize] {
                if p.color == by
                    && (p.piece_type == PieceType::Bishop || p.piece_type == PieceType::Queen)
                {
                    return true;
                }
                break; // blocked
            }
            to += d;
        }
    }

    for d in ROOK_DIRS {
        let mut to = sq as i32 + d;
        while (0..64).contains(&to) {
            if d.abs() == 1 && sq_rank(to as usize) != sq_rank((to - d) as usize) {
                break;
            }
            if d.abs() == 8 && file_of(to) != file_of(to - d) {
                break;
            }
            if let Some(p) = board.grid[to as usize] {
                if p.color == by
                    && (p.piece_type == PieceType::Rook || p.piece_type == PieceType::Queen)
                {
                    return true;
                }
                break;
            }
            to += d;
        }
    }

    false
}

/// Whether `color`'s king is currently attacked.
#[must_use]
pub fn in_check(board: &Board, color: Color) -> bool {
    match board.king_sq[color.index()] {
        Some(king) => is_attacked(board, king, color.opposite()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_attacks_along_open_lines() {
        let board = Board::from_fen("7k/8/8/8/3R4/8/8/7K w - - 0 1");
        // Rook on d4
        assert!(is_attacked(&board, 3, Color::White)); // d1
        assert!(is_attacked(&board, 31, Color::White)); // h4
        assert!(!is_attacked(&board, 0, Color::White)); // a1, off the lines
    }

    #[test]
    fn blockers_cut_rays() {
        let board = Board::from_fen("7k/8/3P4/8/3R4/8/8/7K w - - 0 1");
        // Rook d4 with its own pawn on d6: d5 is covered, d7 is shadowed.
        assert!(is_attacked(&board, 35, Color::White)); // d5
        assert!(!is_attacked(&board, 51, Color::White)); // d7
        assert!(is_attacked(&board, 50, Color::White)); // c7, pawn diagonal
    }

    #[test]
    fn pawn_attacks_are_directional() {
        let board = Board::from_fen("7k/8/8/8/3p4/8/3P4/7K w - - 0 1");
        // White pawn d2 attacks c3/e3, not d3
        assert!(is_attacked(&board, 18, Color::White));
        assert!(is_attacked(&board, 20, Color::White));
        assert!(!is_attacked(&board, 19, Color::White));
        // Black pawn d4 attacks c3/e3
        assert!(is_attacked(&board, 18, Color::Black));
        assert!(is_attacked(&board, 20, Color::Black));
    }

    #[test]
    fn knight_jumps_do_not_wrap() {
        // Knight on h4 must not "attack" across the board edge.
        let board = Board::from_fen("7k/8/8/8/7N/8/8/7K w - - 0 1");
        assert!(is_attacked(&board, 46, Color::White)); // g6
        assert!(is_attacked(&board, 14, Color::White)); // g2
        assert!(!is_attacked(&board, 48, Color::White)); // a7 would be a wrap
        assert!(!is_attacked(&board, 25, Color::White)); // b4 would be a wrap
    }

    #[test]
    fn slider_rays_do_not_wrap() {
        let board = Board::from_fen("7k/8/8/8/8/8/8/6KR w - - 0 1");
        // Rook h1: a2 (sq 8) is h1+1 in index terms but a different rank.
        assert!(!is_attacked(&board, 8, Color::White));
        assert!(is_attacked(&board, 63, Color::White)); // h8
    }

    #[test]
    fn in_check_reads_the_right_king() {
        let board = Board::from_fen("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1");
        assert!(in_check(&board, Color::Black));
        assert!(!in_check(&board, Color::White));
    }
}
