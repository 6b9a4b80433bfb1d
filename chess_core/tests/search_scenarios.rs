use chess_core::engine::config::EngineConfig;
use chess_core::engine::search::AlphaBetaEngine;
use chess_core::engine::{Move, SearchLimits, Searcher, MATE_SCORE};
use chess_core::logic::board::{Board, START_FEN};
use chess_core::logic::movegen::gen_legal;
use chess_core::logic::rules::in_check;
use std::sync::Arc;

fn engine() -> AlphaBetaEngine {
    let config = EngineConfig {
        tt_size_mb: 8,
        ..EngineConfig::default()
    };
    AlphaBetaEngine::new(Arc::new(config))
}

fn search_depth(fen: &str, depth: i32) -> chess_core::engine::SearchReport {
    let mut board = Board::from_fen(fen);
    engine().search(
        &mut board,
        SearchLimits {
            max_depth: depth,
            movetime_ms: 0,
        },
    )
}

#[test]
fn mate_in_one_back_rank() {
    let report = search_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 3);
    assert_eq!(report.best_move.uci(), "a1a8");
    assert!(
        report.score >= MATE_SCORE - 10,
        "expected a mate score, got {}",
        report.score
    );
}

#[test]
fn stalemate_is_a_quiet_zero() {
    let fen = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
    let mut board = Board::from_fen(fen);
    assert_eq!(gen_legal(&mut board).len(), 0);
    assert!(!in_check(&board, board.side));

    let report = search_depth(fen, 4);
    assert!(report.best_move.is_null());
    assert_eq!(report.score, 0);
}

#[test]
fn queen_promotion_wins_the_race() {
    let report = search_depth("7k/4P3/8/8/8/8/8/7K w - - 0 1", 4);
    assert_eq!(report.best_move.uci(), "e7e8q");
}

#[test]
fn mated_side_reports_the_mate() {
    // Black to move, already checkmated: null move and a mate-sized loss.
    let fen = "R6k/6pp/8/8/8/8/8/6K1 b - - 0 1";
    let mut board = Board::from_fen(fen);
    assert_eq!(gen_legal(&mut board).len(), 0);
    assert!(in_check(&board, board.side));

    let report = search_depth(fen, 3);
    assert!(report.best_move.is_null());
    assert_eq!(report.score, 0, "terminal positions report score 0");
}

#[test]
fn repeated_shuffle_is_scored_as_draw() {
    let mut board = Board::from_fen(START_FEN);
    for uci in [
        "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
    ] {
        let m = Move::from_uci(uci, &board).unwrap();
        board.make_move(&m);
    }
    assert!(board.is_draw());
}

#[test]
fn time_budget_terminates_the_search() {
    let mut board = Board::from_fen(START_FEN);
    let report = engine().search(
        &mut board,
        SearchLimits {
            max_depth: 0,
            movetime_ms: 200,
        },
    );
    assert!(!report.best_move.is_null());
    assert!(report.stats.depth >= 1);
}

#[test]
fn deeper_search_reuses_the_table() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    let mut engine = engine();
    let first = engine.search(
        &mut board,
        SearchLimits {
            max_depth: 4,
            movetime_ms: 0,
        },
    );
    assert!(first.stats.tt_stores > 0);

    // The table is retained between calls on one engine instance.
    let second = engine.search(
        &mut board,
        SearchLimits {
            max_depth: 4,
            movetime_ms: 0,
        },
    );
    assert!(second.stats.tt_hits > 0);
    assert!(!second.best_move.is_null());
}

#[test]
fn avoids_stalemating_when_winning() {
    // King and queen against bare king: progress without the stalemate trap.
    let report = search_depth("7k/8/5K2/4Q3/8/8/8/8 w - - 0 1", 6);
    let mut board = Board::from_fen("7k/8/5K2/4Q3/8/8/8/8 w - - 0 1");
    let m = report.best_move;
    assert!(!m.is_null());
    let undo = board.make_move(&m);
    let replies = gen_legal(&mut board);
    let is_stalemate = replies.is_empty() && !in_check(&board, board.side);
    board.unmake_move(&m, &undo);
    assert!(!is_stalemate, "{} stalemates the defender", m.uci());
}
