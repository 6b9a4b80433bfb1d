use chess_core::engine::config::EngineConfig;
use chess_core::engine::search::AlphaBetaEngine;
use chess_core::engine::{SearchLimits, Searcher};
use chess_core::logic::board::Board;
use chess_core::protocol::{format_report, parse_request};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

fn main() {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let config = Arc::new(EngineConfig::default());
    // One engine for the whole session; the transposition table carries
    // over between positions of the same game.
    let mut engine = AlphaBetaEngine::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();

        if line == "quit" {
            break;
        }
        if line == "ping" {
            println!("pong");
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let Some(request) = parse_request(line) else {
            continue;
        };

        let mut board = Board::from_fen(&request.fen);
        let report = engine.search(
            &mut board,
            SearchLimits {
                max_depth: request.max_depth,
                movetime_ms: request.movetime_ms,
            },
        );

        println!("{}", format_report(&report));
        let _ = stdout.lock().flush();
    }
}
