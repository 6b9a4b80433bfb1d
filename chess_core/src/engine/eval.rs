use crate::engine::Evaluator;
use crate::logic::board::{make_sq, mirror_sq, sq_file, sq_rank, Board, Color, Piece, PieceType};
use crate::logic::eval_constants::{piece_value, pst_value};

/// Cheap phase test: queenless positions, or positions thinned down to a
/// couple of queens and minors, count as endgame.
#[must_use]
pub fn is_endgame(board: &Board) -> bool {
    let mut queens = 0;
    let mut minors = 0;
    for cell in board.grid.iter().flatten() {
        match cell.piece_type {
            PieceType::Queen => queens += 1,
            PieceType::Knight | PieceType::Bishop => minors += 1,
            _ => {}
        }
    }
    queens == 0 || (queens <= 2 && minors <= 2)
}

/// Material, piece-square tables, pawn structure, rook files, bishop pair
/// and a middlegame king shield. The score is always from White's point
/// of view; the search negates it for Black to move.
pub struct ClassicalEvaluator;

impl Evaluator for ClassicalEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let endgame = is_endgame(board);
        let mut score = 0;
        let mut white_bishops = 0;
        let mut black_bishops = 0;
        let mut white_pawn_files = [0i32; 8];
        let mut black_pawn_files = [0i32; 8];

        for (sq, cell) in board.grid.iter().enumerate() {
            let Some(piece) = cell else { continue };
            let pt = piece.piece_type;
            let val = piece_value(pt);
            match piece.color {
                Color::White => {
                    score += val + pst_value(pt, mirror_sq(sq), endgame);
                    if pt == PieceType::Pawn {
                        white_pawn_files[sq_file(sq)] += 1;
                    }
                    if pt == PieceType::Bishop {
                        white_bishops += 1;
                    }
                }
                Color::Black => {
                    score -= val + pst_value(pt, sq, endgame);
                    if pt == PieceType::Pawn {
                        black_pawn_files[sq_file(sq)] += 1;
                    }
                    if pt == PieceType::Bishop {
                        black_bishops += 1;
                    }
                }
            }
        }

        if white_bishops >= 2 {
            score += 30;
        }
        if black_bishops >= 2 {
            score -= 30;
        }

        // Doubled and isolated pawns, per file
        for f in 0..8 {
            if white_pawn_files[f] > 1 {
                score -= 10 * (white_pawn_files[f] - 1);
            }
            if black_pawn_files[f] > 1 {
                score += 10 * (black_pawn_files[f] - 1);
            }

            let w_adj = (f > 0 && white_pawn_files[f - 1] > 0)
                || (f < 7 && white_pawn_files[f + 1] > 0);
            let b_adj = (f > 0 && black_pawn_files[f - 1] > 0)
                || (f < 7 && black_pawn_files[f + 1] > 0);
            if white_pawn_files[f] > 0 && !w_adj {
                score -= 15;
            }
            if black_pawn_files[f] > 0 && !b_adj {
                score += 15;
            }
        }

        // Passed pawns, scaled by advancement
        for (sq, cell) in board.grid.iter().enumerate() {
            let Some(piece) = cell else { continue };
            if piece.piece_type != PieceType::Pawn {
                continue;
            }
            let f = sq_file(sq);
            let r = sq_rank(sq);
            match piece.color {
                Color::White => {
                    let mut passed = true;
                    'outer: for rr in (r + 1)..8 {
                        for ff in f.saturating_sub(1)..=(f + 1).min(7) {
                            if board.grid[make_sq(ff, rr)]
                                == Some(Piece::new(PieceType::Pawn, Color::Black))
                            {
                                passed = false;
                                break 'outer;
                            }
                        }
                    }
                    if passed {
                        score += 20 + 10 * r as i32;
                    }
                }
                Color::Black => {
                    let mut passed = true;
                    'outer: for rr in (0..r).rev() {
                        for ff in f.saturating_sub(1)..=(f + 1).min(7) {
                            if board.grid[make_sq(ff, rr)]
                                == Some(Piece::new(PieceType::Pawn, Color::White))
                            {
                                passed = false;
                                break 'outer;
                            }
                        }
                    }
                    if passed {
                        score -= 20 + 10 * (7 - r) as i32;
                    }
                }
            }
        }

        // Rooks on open and semi-open files
        for (sq, cell) in board.grid.iter().enumerate() {
            let Some(piece) = cell else { continue };
            if piece.piece_type != PieceType::Rook {
                continue;
            }
            let f = sq_file(sq);
            match piece.color {
                Color::White => {
                    if white_pawn_files[f] == 0 && black_pawn_files[f] == 0 {
                        score += 20;
                    } else if white_pawn_files[f] == 0 {
                        score += 10;
                    }
                }
                Color::Black => {
                    if white_pawn_files[f] == 0 && black_pawn_files[f] == 0 {
                        score -= 20;
                    } else if black_pawn_files[f] == 0 {
                        score -= 10;
                    }
                }
            }
        }

        // Pawn shield on the two ranks in front of the king, middlegame only
        if !endgame {
            for color in [Color::White, Color::Black] {
                let Some(ksq) = board.king_sq[color.index()] else {
                    continue;
                };
                let kf = sq_file(ksq) as i32;
                let kr = sq_rank(ksq) as i32;
                let dir = if color == Color::White { 1 } else { -1 };
                let pawn = Some(Piece::new(PieceType::Pawn, color));
                let mut shield = 0;
                for df in -1..=1 {
                    let ff = kf + df;
                    if !(0..8).contains(&ff) {
                        continue;
                    }
                    for step in 1..=2 {
                        let sr = kr + step * dir;
                        if (0..8).contains(&sr)
                            && board.grid[make_sq(ff as usize, sr as usize)] == pawn
                        {
                            shield += 1;
                        }
                    }
                }
                match color {
                    Color::White => score += shield * 10,
                    Color::Black => score -= shield * 10,
                }
            }
        }

        score
    }
}
