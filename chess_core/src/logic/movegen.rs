use crate::engine::move_list::MoveList;
use crate::engine::{Move, FLAG_CASTLE, FLAG_DOUBLE_PUSH, FLAG_EN_PASSANT};
use crate::logic::board::{
    sq_file, sq_rank, Board, Color, Piece, PieceType, BISHOP_DIRS, CASTLE_BK, CASTLE_BQ,
    CASTLE_WK, CASTLE_WQ, KING_DIRS, KNIGHT_DIRS, ROOK_DIRS,
};
use crate::logic::rules::{in_check, is_attacked};

const PROMOTION_TYPES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

/// All pseudo-legal moves for the side to move. Self-check filtering is
/// the caller's job (see [`gen_legal`]).
pub fn gen_pseudo(board: &Board, moves: &mut MoveList) {
    gen_pawn_moves(board, moves);
    gen_knight_moves(board, moves, false);
    gen_slider_moves(board, moves, PieceType::Bishop, false);
    gen_slider_moves(board, moves, PieceType::Rook, false);
    gen_slider_moves(board, moves, PieceType::Queen, false);
    gen_king_moves(board, moves);
}

/// Noisy moves only, for quiescence: captures, en passant, and the
/// queen promotion by push (a material event worth searching).
pub fn gen_captures(board: &Board, moves: &mut MoveList) {
    gen_pawn_captures(board, moves);
    gen_knight_moves(board, moves, true);
    gen_slider_moves(board, moves, PieceType::Bishop, true);
    gen_slider_moves(board, moves, PieceType::Rook, true);
    gen_slider_moves(board, moves, PieceType::Queen, true);
    gen_king_captures(board, moves);
}

/// Pseudo-legal generation filtered by playing each move and rejecting
/// those that leave the mover's king attacked. Correct by construction,
/// no separate pin detection needed.
pub fn gen_legal(board: &mut Board) -> MoveList {
    let mut pseudo = MoveList::new();
    gen_pseudo(board, &mut pseudo);

    let mut legal = MoveList::new();
    let mover = board.side;
    for i in 0..pseudo.len() {
        let m = pseudo[i];
        let undo = board.make_move(&m);
        if !in_check(board, mover) {
            legal.push(m);
        }
        board.unmake_move(&m, &undo);
    }
    legal
}

/// Single-move probe: would this pseudo-legal move leave the king hanging?
pub fn is_legal(board: &mut Board, m: &Move) -> bool {
    let mover = board.side;
    let undo = board.make_move(m);
    let legal = !in_check(board, mover);
    board.unmake_move(m, &undo);
    legal
}

/// Leaf count to `depth`, for validating the generator against the
/// classical tables.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = gen_legal(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for i in 0..moves.len() {
        let m = moves[i];
        let undo = board.make_move(&m);
        nodes += perft(board, depth - 1);
        board.unmake_move(&m, &undo);
    }
    nodes
}

fn gen_pawn_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side;
    let pawn = Some(Piece::new(PieceType::Pawn, side));
    let dir: i32 = if side == Color::White { 8 } else { -8 };
    let start_rank = if side == Color::White { 1 } else { 6 };
    let promo_rank = if side == Color::White { 7 } else { 0 };

    for sq in 0..64 {
        if board.grid[sq] != pawn {
            continue;
        }
        let f = sq_file(sq);

        // Pushes
        let to = sq as i32 + dir;
        if (0..64).contains(&to) && board.grid[to as usize].is_none() {
            let to = to as usize;
            if sq_rank(to) == promo_rank {
                for pt in PROMOTION_TYPES {
                    moves.push(Move {
                        promotion: Some(pt),
                        ..Move::new(sq, to)
                    });
                }
            } else {
                moves.push(Move::new(sq, to));
                if sq_rank(sq) == start_rank {
                    let to2 = (sq as i32 + 2 * dir) as usize;
                    if board.grid[to2].is_none() {
                        moves.push(Move {
                            flags: FLAG_DOUBLE_PUSH,
                            ..Move::new(sq, to2)
                        });
                    }
                }
            }
        }

        // Diagonal captures and en passant
        for (df, dd) in [(-1, dir - 1), (1, dir + 1)] {
            let cf = f as i32 + df;
            if !(0..8).contains(&cf) {
                continue;
            }
            let to = sq as i32 + dd;
            if !(0..64).contains(&to) {
                continue;
            }
            let to = to as usize;
            if let Some(target) = board.grid[to] {
                if target.color != side {
                    if sq_rank(to) == promo_rank {
                        for pt in PROMOTION_TYPES {
                            moves.push(Move {
                                captured: Some(target),
                                promotion: Some(pt),
                                ..Move::new(sq, to)
                            });
                        }
                    } else {
                        moves.push(Move {
                            captured: Some(target),
                            ..Move::new(sq, to)
                        });
                    }
                }
            }
            if board.ep_square == Some(to) {
                moves.push(Move {
                    captured: Some(Piece::new(PieceType::Pawn, side.opposite())),
                    flags: FLAG_EN_PASSANT,
                    ..Move::new(sq, to)
                });
            }
        }
    }
}

fn gen_pawn_captures(board: &Board, moves: &mut MoveList) {
    let side = board.side;
    let pawn = Some(Piece::new(PieceType::Pawn, side));
    let dir: i32 = if side == Color::White { 8 } else { -8 };
    let promo_rank = if side == Color::White { 7 } else { 0 };

    for sq in 0..64 {
        if board.grid[sq] != pawn {
            continue;
        }
        let f = sq_file(sq);

        // Promotion by push counts as noisy; queen only here
        let fwd = sq as i32 + dir;
        if (0..64).contains(&fwd)
            && board.grid[fwd as usize].is_none()
            && sq_rank(fwd as usize) == promo_rank
        {
            moves.push(Move {
                promotion: Some(PieceType::Queen),
                ..Move::new(sq, fwd as usize)
            });
        }

        for (df, dd) in [(-1, dir - 1), (1, dir + 1)] {
            let cf = f as i32 + df;
            if !(0..8).contains(&cf) {
                continue;
            }
            let to = sq as i32 + dd;
            if !(0..64).contains(&to) {
                continue;
            }
            let to = to as usize;
            if let Some(target) = board.grid[to] {
                if target.color != side {
                    if sq_rank(to) == promo_rank {
                        moves.push(Move {
                            captured: Some(target),
                            promotion: Some(PieceType::Queen),
                            ..Move::new(sq, to)
                        });
                    } else {
                        moves.push(Move {
                            captured: Some(target),
                            ..Move::new(sq, to)
                        });
                    }
                }
            }
            if board.ep_square == Some(to) {
                moves.push(Move {
                    captured: Some(Piece::new(PieceType::Pawn, side.opposite())),
                    flags: FLAG_EN_PASSANT,
                    ..Move::new(sq, to)
                });
            }
        }
    }
}

fn gen_knight_moves(board: &Board, moves: &mut MoveList, only_captures: bool) {
    let side = board.side;
    let knight = Some(Piece::new(PieceType::Knight, side));
    for sq in 0..64 {
        if board.grid[sq] != knight {
            continue;
        }
        for d in KNIGHT_DIRS {
            let to = sq as i32 + d;
            if !(0..64).contains(&to) {
                continue;
            }
            if (sq_file(to as usize) as i32 - sq_file(sq) as i32).abs() > 2 {
                continue;
            }
            push_step(board, moves, sq, to as usize, only_captures);
        }
    }
}

fn gen_slider_moves(board: &Board, moves: &mut MoveList, piece_type: PieceType, only_captures: bool) {
    let side = board.side;
    let piece = Some(Piece::new(piece_type, side));
    let dirs: &[i32] = match piece_type {
        PieceType::Bishop => &BISHOP_DIRS,
        PieceType::Rook => &ROOK_DIRS,
        _ => &KING_DIRS, // queen: all eight rays
    };

    for sq in 0..64 {
        if board.grid[sq] != piece {
            continue;
        }
        for &d in dirs {
            let mut to = sq as i32 + d;
            while (0..64).contains(&to) {
                let prev = to - d;
                if (sq_file(to as usize) as i32 - sq_file(prev as usize) as i32).abs() > 1 {
                    break; // wrapped
                }
                match board.grid[to as usize] {
                    None => {
                        if !only_captures {
                            moves.push(Move::new(sq, to as usize));
                        }
                    }
                    Some(target) => {
                        if target.color != side {
                            moves.push(Move {
                                captured: Some(target),
                                ..Move::new(sq, to as usize)
                            });
                        }
                        break;
                    }
                }
                to += d;
            }
        }
    }
}

fn gen_king_moves(board: &Board, moves: &mut MoveList) {
    let side = board.side;
    let Some(sq) = board.king_sq[side.index()] else {
        return;
    };

    for d in KING_DIRS {
        let to = sq as i32 + d;
        if !(0..64).contains(&to) {
            continue;
        }
        if (sq_file(to as usize) as i32 - sq_file(sq) as i32).abs() > 1 {
            continue;
        }
        push_step(board, moves, sq, to as usize, false);
    }

    // Castling: rights intact, path clear, and the king never crosses an
    // attacked square. A queenside b-file attack does not disqualify.
    if is_attacked(board, sq, side.opposite()) {
        return;
    }
    let enemy = side.opposite();
    match side {
        Color::White => {
            if board.castling & CASTLE_WK != 0
                && board.grid[5].is_none()
                && board.grid[6].is_none()
                && !is_attacked(board, 5, enemy)
                && !is_attacked(board, 6, enemy)
            {
                moves.push(Move {
                    flags: FLAG_CASTLE,
                    ..Move::new(4, 6)
                });
            }
            if board.castling & CASTLE_WQ != 0
                && board.grid[3].is_none()
                && board.grid[2].is_none()
                && board.grid[1].is_none()
                && !is_attacked(board, 3, enemy)
                && !is_attacked(board, 2, enemy)
            {
                moves.push(Move {
                    flags: FLAG_CASTLE,
                    ..Move::new(4, 2)
                });
            }
        }
        Color::Black => {
            if board.castling & CASTLE_BK != 0
                && board.grid[61].is_none()
                && board.grid[62].is_none()
                && !is_attacked(board, 61, enemy)
                && !is_attacked(board, 62, enemy)
            {
                moves.push(Move {
                    flags: FLAG_CASTLE,
                    ..Move::new(60, 62)
                });
            }
            if board.castling & CASTLE_BQ != 0
                && board.grid[59].is_none()
                && board.grid[58].is_none()
                && board.grid[57].is_none()
                && !is_attacked(board, 59, enemy)
                && !is_attacked(board, 58, enemy)
            {
                moves.push(Move {
                    flags: FLAG_CASTLE,
                    ..Move::new(60, 58)
                });
            }
        }
    }
}

fn gen_king_captures(board: &Board, moves: &mut MoveList) {
    let side = board.side;
    let Some(sq) = board.king_sq[side.index()] else {
        return;
    };
    for d in KING_DIRS {
        let to = sq as i32 + d;
        if !(0..64).contains(&to) {
            continue;
        }
        if (sq_file(to as usize) as i32 - sq_file(sq) as i32).abs() > 1 {
            continue;
        }
        push_step(board, moves, sq, to as usize, true);
    }
}

fn push_step(board: &Board, moves: &mut MoveList, from: usize, to: usize, only_captures: bool) {
    match board.grid[to] {
        None => {
            if !only_captures {
                moves.push(Move::new(from, to));
            }
        }
        Some(target) => {
            if target.color != board.side {
                moves.push(Move {
                    captured: Some(target),
                    ..Move::new(from, to)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::START_FEN;

    fn uci_set(moves: &MoveList) -> Vec<String> {
        moves.iter().map(Move::uci).collect()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let mut board = Board::from_fen(START_FEN);
        assert_eq!(gen_legal(&mut board).len(), 20);
    }

    #[test]
    fn en_passant_is_generated_and_captures() {
        let mut board = Board::from_fen(START_FEN);
        for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            let m = Move::from_uci(uci, &board).unwrap();
            board.make_move(&m);
        }
        let legal = gen_legal(&mut board);
        let ep = legal
            .iter()
            .find(|m| m.uci() == "e5d6")
            .copied()
            .expect("e5d6 must be legal");
        assert_ne!(ep.flags & FLAG_EN_PASSANT, 0);

        board.make_move(&ep);
        // The d5 pawn is gone, the capturer sits on d6
        assert_eq!(board.grid[35], None);
        assert_eq!(
            board.grid[43],
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert_eq!(board.hash, board.calculate_hash());
    }

    #[test]
    fn castling_through_check_is_illegal() {
        // Black rook on f8 guards f1; kingside castling must not appear.
        let mut board = Board::from_fen("5r1k/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(!uci_set(&gen_legal(&mut board)).contains(&"e1g1".to_string()));

        // Without the rook it is there.
        let mut board = Board::from_fen("7k/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(uci_set(&gen_legal(&mut board)).contains(&"e1g1".to_string()));
    }

    #[test]
    fn queenside_b_file_attack_does_not_block_castling() {
        // b1 is attacked, but the king never crosses it.
        let mut board = Board::from_fen("1r5k/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(uci_set(&gen_legal(&mut board)).contains(&"e1c1".to_string()));

        // An attack on d1 does block it.
        let mut board = Board::from_fen("3r3k/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(!uci_set(&gen_legal(&mut board)).contains(&"e1c1".to_string()));
    }

    #[test]
    fn promotion_expands_to_four_choices() {
        let mut board = Board::from_fen("7k/4P3/8/8/8/8/8/7K w - - 0 1");
        let ucis = uci_set(&gen_legal(&mut board));
        for m in ["e7e8q", "e7e8r", "e7e8b", "e7e8n"] {
            assert!(ucis.contains(&m.to_string()), "{m} missing");
        }
    }

    #[test]
    fn captures_generator_is_noisy_only() {
        let board = Board::from_fen("7k/4P3/8/3p4/4P3/8/8/7K w - - 0 1");
        let mut moves = MoveList::new();
        gen_captures(&board, &mut moves);
        let ucis: Vec<String> = moves.iter().map(Move::uci).collect();
        // The e4xd5 capture and the queen promotion push, nothing quiet.
        assert!(ucis.contains(&"e4d5".to_string()));
        assert!(ucis.contains(&"e7e8q".to_string()));
        assert!(!ucis.contains(&"e4e5".to_string()));
        assert!(!ucis.contains(&"e7e8n".to_string()));
        for i in 0..moves.len() {
            let m = moves[i];
            assert!(m.captured.is_some() || m.promotion.is_some());
        }
    }

    #[test]
    fn legality_filter_respects_pins() {
        // The e-file knight is pinned against the king and cannot move.
        let mut board = Board::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        let legal = gen_legal(&mut board);
        assert!(legal.iter().all(|m| m.from != 12));
    }

    #[test]
    fn single_move_probe_agrees_with_filter() {
        let mut board = Board::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        let pinned = Move::from_uci("e2c3", &board).unwrap();
        assert!(!is_legal(&mut board, &pinned));
        let fine = Move::from_uci("e1d1", &board).unwrap();
        assert!(is_legal(&mut board, &fine));
    }
}
