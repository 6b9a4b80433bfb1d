use crate::engine::config::EngineConfig;
use crate::engine::eval::{is_endgame, ClassicalEvaluator};
use crate::engine::move_list::MoveList;
use crate::engine::tt::{TTFlag, TranspositionTable};
use crate::engine::{
    Evaluator, Move, SearchLimits, SearchReport, SearchStats, Searcher, INF_SCORE, MATE_SCORE,
    MAX_PLY,
};
use crate::logic::board::{Board, Color};
use crate::logic::eval_constants::piece_value;
use crate::logic::movegen::{gen_captures, gen_legal};
use crate::logic::rules::in_check;
use std::sync::Arc;
use std::time::Instant;

// Poll the clock once per this many nodes.
const TIME_CHECK_MASK: u64 = 4095;

pub struct AlphaBetaEngine {
    config: Arc<EngineConfig>,
    evaluator: ClassicalEvaluator,
    tt: TranspositionTable,
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: Box<[[[i32; 64]; 64]; 2]>,
    nodes: u64,
    tt_hits: u64,
    tt_stores: u64,
    start_time: Instant,
    max_time_ms: i64,
    time_up: bool,
}

impl AlphaBetaEngine {
    #[must_use]
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let tt = TranspositionTable::new(config.tt_size_mb);
        Self {
            config,
            evaluator: ClassicalEvaluator,
            tt,
            killers: [[None; 2]; MAX_PLY],
            history: Box::new([[[0; 64]; 64]; 2]),
            nodes: 0,
            tt_hits: 0,
            tt_stores: 0,
            start_time: Instant::now(),
            max_time_ms: 0,
            time_up: false,
        }
    }

    fn elapsed_ms(&self) -> i64 {
        self.start_time.elapsed().as_millis() as i64
    }

    fn check_time(&mut self) {
        if self.max_time_ms <= 0 {
            return;
        }
        if self.elapsed_ms() >= self.max_time_ms {
            self.time_up = true;
        }
    }

    /// Assigns ordering scores: hash move, then captures by MVV-LVA, then
    /// promotions, killers, and finally the history counters for quiets.
    fn score_moves(&self, board: &Board, moves: &mut MoveList, ply: usize, tt_move: Option<Move>) {
        let side = board.side.index();
        for i in 0..moves.len() {
            let m = moves[i];
            let score = if tt_move == Some(m) {
                self.config.score_tt_move
            } else if let Some(captured) = m.captured {
                let attacker = board.grid[m.from as usize]
                    .map_or(0, |p| piece_value(p.piece_type));
                self.config.score_capture_base + piece_value(captured.piece_type) * 10 - attacker
            } else if let Some(promo) = m.promotion {
                self.config.score_promotion_base + piece_value(promo)
            } else if ply < MAX_PLY && self.killers[ply][0] == Some(m) {
                self.config.score_killer_primary
            } else if ply < MAX_PLY && self.killers[ply][1] == Some(m) {
                self.config.score_killer_secondary
            } else {
                self.history[side][m.from as usize][m.to as usize]
            };
            moves[i].score = score;
        }
    }

    /// One step of selection sort: swap the best remaining move to `start`.
    /// Cutoffs usually come early, so this beats sorting the whole list.
    fn pick_move(moves: &mut MoveList, start: usize) {
        let mut best = start;
        for i in (start + 1)..moves.len() {
            if moves[i].score > moves[best].score {
                best = i;
            }
        }
        if best != start {
            moves.swap(start, best);
        }
    }

    fn store_killer(&mut self, ply: usize, m: Move) {
        if self.killers[ply][0] != Some(m) {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = Some(m);
        }
    }

    fn bump_history(&mut self, side: usize, m: Move, depth: i32) {
        let slot = &mut self.history[side][m.from as usize][m.to as usize];
        *slot += depth * depth;
        if *slot > self.config.history_limit {
            for side in self.history.iter_mut() {
                for from in side.iter_mut() {
                    for v in from.iter_mut() {
                        *v >>= 1;
                    }
                }
            }
        }
    }

    fn root_search(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        best_move: &mut Move,
    ) -> i32 {
        let mut moves = gen_legal(board);
        if moves.is_empty() {
            *best_move = Move::default();
            return if in_check(board, board.side) {
                -MATE_SCORE
            } else {
                0
            };
        }

        // The stored score is not trusted at the root (aspiration windows
        // make it unreliable here); the move is still gold for ordering.
        let tt_move = self.tt.probe(board.hash).map(|e| e.best_move);
        self.score_moves(board, &mut moves, 0, tt_move);

        let mut best_score = -INF_SCORE;
        *best_move = moves[0];

        for i in 0..moves.len() {
            Self::pick_move(&mut moves, i);
            let m = moves[i];

            let undo = board.make_move(&m);
            let score = -self.alphabeta(board, depth - 1, -beta, -alpha, 1, true);
            board.unmake_move(&m, &undo);

            if self.time_up {
                break;
            }
            if score > best_score {
                best_score = score;
                *best_move = m;
            }
            if score > alpha {
                alpha = score;
            }
        }

        if self
            .tt
            .store(board.hash, depth, best_score, TTFlag::Exact, *best_move)
        {
            self.tt_stores += 1;
        }
        best_score
    }

    #[allow(clippy::too_many_lines)]
    fn alphabeta(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        null_ok: bool,
    ) -> i32 {
        self.nodes += 1;
        if self.nodes & TIME_CHECK_MASK == 0 {
            self.check_time();
        }
        if self.time_up {
            return 0;
        }

        if board.is_draw() {
            return 0;
        }

        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(board.hash) {
            tt_move = Some(entry.best_move);
            if ply > 0 && entry.depth >= depth {
                let usable = match entry.flag {
                    TTFlag::Exact => true,
                    TTFlag::LowerBound => entry.score >= beta,
                    TTFlag::UpperBound => entry.score <= alpha,
                };
                if usable {
                    self.tt_hits += 1;
                    return entry.score;
                }
            }
        }

        if depth <= 0 {
            return self.quiescence(board, alpha, beta, ply);
        }

        let in_check_now = in_check(board, board.side);
        // Check extension: don't let the horizon fall inside a forcing line
        let depth = if in_check_now { depth + 1 } else { depth };

        // Null-move pruning: hand over the move; if a shallow refutation
        // still clears beta, the real position surely does. Unsound in
        // zugzwang, hence the endgame guard, and never two in a row.
        if null_ok && !in_check_now && depth >= 3 && !is_endgame(board) {
            let r = if depth >= 6 { 3 } else { 2 };
            let undo = board.make_null_move();
            let null_score = -self.alphabeta(board, depth - 1 - r, -beta, -beta + 1, ply + 1, false);
            board.unmake_null_move(&undo);
            if self.time_up {
                return 0;
            }
            if null_score >= beta {
                return beta;
            }
        }

        let mut moves = gen_legal(board);
        if moves.is_empty() {
            return if in_check_now { -(MATE_SCORE - ply) } else { 0 };
        }

        self.score_moves(board, &mut moves, ply as usize, tt_move);

        let mut best_score = -INF_SCORE;
        let mut best_move = moves[0];
        let mut tt_flag = TTFlag::UpperBound;

        for i in 0..moves.len() {
            Self::pick_move(&mut moves, i);
            let m = moves[i];
            let is_capture = m.captured.is_some();
            let is_promotion = m.promotion.is_some();

            let undo = board.make_move(&m);
            let gives_check = in_check(board, board.side);

            let mut score;
            if i >= 3 && depth >= 3 && !in_check_now && !gives_check && !is_capture && !is_promotion
            {
                // Late move reduction: a well-ordered quiet move this far
                // down the list rarely matters; scout it shallow and only
                // spend full depth if it surprises.
                let r = 1 + i32::from(i >= 6) + i32::from(depth >= 6);
                score = -self.alphabeta(board, depth - 1 - r, -alpha - 1, -alpha, ply + 1, true);
                if score > alpha {
                    score = -self.alphabeta(board, depth - 1, -beta, -alpha, ply + 1, true);
                }
            } else {
                score = -self.alphabeta(board, depth - 1, -beta, -alpha, ply + 1, true);
            }

            board.unmake_move(&m, &undo);
            if self.time_up {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = m;
            }
            if score > alpha {
                alpha = score;
                tt_flag = TTFlag::Exact;

                if score >= beta {
                    tt_flag = TTFlag::LowerBound;
                    if !is_capture && !is_promotion && (ply as usize) < MAX_PLY {
                        self.store_killer(ply as usize, m);
                        self.bump_history(board.side.index(), m, depth);
                    }
                    break;
                }
            }
        }

        if self
            .tt
            .store(board.hash, depth, best_score, tt_flag, best_move)
        {
            self.tt_stores += 1;
        }
        best_score
    }

    fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        self.nodes += 1;
        if self.nodes & TIME_CHECK_MASK == 0 {
            self.check_time();
        }
        if self.time_up {
            return 0;
        }

        // Standing pat: the side to move can usually do at least as well
        // as doing nothing noisy.
        let mut stand_pat = self.evaluator.evaluate(board);
        if board.side == Color::Black {
            stand_pat = -stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        // Delta pruning: even winning a queen cannot lift this position
        if stand_pat + self.config.delta_margin < alpha {
            return alpha;
        }

        let mut moves = MoveList::new();
        gen_captures(board, &mut moves);
        for i in 0..moves.len() {
            let m = moves[i];
            let victim = m.captured.map_or(0, |p| piece_value(p.piece_type));
            let attacker = board.grid[m.from as usize]
                .map_or(0, |p| piece_value(p.piece_type));
            moves[i].score = victim * 10 - attacker;
        }

        let in_check_now = in_check(board, board.side);
        let mover = board.side;

        for i in 0..moves.len() {
            Self::pick_move(&mut moves, i);
            let m = moves[i];

            // Crude exchange filter: skip captures that trade down badly
            if m.score < self.config.bad_capture_threshold && !in_check_now {
                continue;
            }

            let undo = board.make_move(&m);
            if in_check(board, mover) {
                board.unmake_move(&m, &undo);
                continue;
            }

            let score = -self.quiescence(board, -beta, -alpha, ply + 1);
            board.unmake_move(&m, &undo);

            if self.time_up {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

impl Searcher for AlphaBetaEngine {
    fn search(&mut self, board: &mut Board, limits: SearchLimits) -> SearchReport {
        self.start_time = Instant::now();
        self.max_time_ms = limits.movetime_ms;
        self.time_up = false;
        self.nodes = 0;
        self.tt_hits = 0;
        self.tt_stores = 0;
        self.killers = [[None; 2]; MAX_PLY];
        *self.history = [[[0; 64]; 64]; 2];

        let mut report = SearchReport {
            best_move: Move::default(),
            score: 0,
            stats: SearchStats::default(),
        };

        let legal = gen_legal(board);
        if legal.is_empty() {
            report.stats.time_ms = self.elapsed_ms() as u64;
            return report;
        }
        report.best_move = legal[0];

        let max_depth = if limits.max_depth <= 0 {
            100 // the clock decides
        } else {
            limits.max_depth
        };

        for depth in 1..=max_depth {
            let mut best = Move::default();
            let score;

            if depth >= 5 {
                // Aspiration: assume this iteration lands near the last
                // one; a miss on either side buys one full-window redo.
                let alpha = report.score - self.config.aspiration_window;
                let beta = report.score + self.config.aspiration_window;
                let mut s = self.root_search(board, depth, alpha, beta, &mut best);
                if self.time_up {
                    break;
                }
                if s <= alpha || s >= beta {
                    s = self.root_search(board, depth, -INF_SCORE, INF_SCORE, &mut best);
                }
                score = s;
            } else {
                score = self.root_search(board, depth, -INF_SCORE, INF_SCORE, &mut best);
            }

            if self.time_up && depth > 1 {
                break; // keep the previous completed iteration
            }

            if !best.is_null() {
                report.best_move = best;
                report.score = score;
                report.stats.depth = depth;
                tracing::debug!(
                    "depth {} score {} nodes {} time {}ms",
                    depth,
                    score,
                    self.nodes,
                    self.elapsed_ms()
                );
            }

            if score.abs() > MATE_SCORE - 100 {
                break; // a forced mate does not improve with depth
            }

            // Don't start an iteration that is unlikely to finish
            if self.max_time_ms > 0 && self.elapsed_ms() > self.max_time_ms / 2 {
                break;
            }
        }

        report.stats.nodes = self.nodes;
        report.stats.time_ms = self.elapsed_ms() as u64;
        report.stats.tt_hits = self.tt_hits;
        report.stats.tt_stores = self.tt_stores;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::START_FEN;

    fn engine() -> AlphaBetaEngine {
        // A small table keeps the tests light
        let config = EngineConfig {
            tt_size_mb: 8,
            ..EngineConfig::default()
        };
        AlphaBetaEngine::new(Arc::new(config))
    }

    #[test]
    fn finds_a_move_from_the_start() {
        let mut engine = engine();
        let mut board = Board::from_fen(START_FEN);
        let report = engine.search(
            &mut board,
            SearchLimits {
                max_depth: 4,
                movetime_ms: 0,
            },
        );
        assert!(!report.best_move.is_null());
        assert_eq!(report.stats.depth, 4);
        assert!(report.stats.nodes > 0);
        assert!(report.stats.tt_stores > 0);
    }

    #[test]
    fn stalemate_returns_null_move() {
        let mut engine = engine();
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(gen_legal(&mut board).is_empty());
        assert!(!in_check(&board, board.side));
        let report = engine.search(
            &mut board,
            SearchLimits {
                max_depth: 3,
                movetime_ms: 0,
            },
        );
        assert!(report.best_move.is_null());
        assert_eq!(report.score, 0);
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let mut engine = engine();
        let mut board = Board::from_fen(START_FEN);
        let before = board.clone();
        engine.search(
            &mut board,
            SearchLimits {
                max_depth: 3,
                movetime_ms: 0,
            },
        );
        assert_eq!(board, before);
    }

    #[test]
    fn prefers_winning_a_queen() {
        let mut engine = engine();
        // White to move, black queen hanging on d5
        let mut board = Board::from_fen("6k1/8/8/3q4/8/8/3R4/6K1 w - - 0 1");
        let report = engine.search(
            &mut board,
            SearchLimits {
                max_depth: 4,
                movetime_ms: 0,
            },
        );
        assert_eq!(report.best_move.uci(), "d2d5");
    }
}
