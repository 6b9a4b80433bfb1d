//! The line-oriented contract with the process driving the engine:
//! one position request per line in, one best-move record per line out.

use crate::engine::SearchReport;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MOVETIME_MS: i64 = 120_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub fen: String,
    pub max_depth: i32,
    pub movetime_ms: i64,
}

/// Parses `FEN | max_depth | movetime_ms`. A single numeric tail is read
/// as the movetime; unparsable numbers fall back to the defaults
/// (depth 0 = time-bounded, movetime 120 s). A line without any `|`
/// separator is not a request.
#[must_use]
pub fn parse_request(line: &str) -> Option<SearchRequest> {
    let mut parts = line.splitn(3, '|');
    let fen = parts.next()?.trim();
    if fen.is_empty() {
        return None;
    }
    let second = parts.next()?;

    let (max_depth, movetime_ms) = match parts.next() {
        Some(third) => (
            second.trim().parse().unwrap_or(0),
            third.trim().parse().unwrap_or(DEFAULT_MOVETIME_MS),
        ),
        None => (0, second.trim().parse().unwrap_or(DEFAULT_MOVETIME_MS)),
    };

    Some(SearchRequest {
        fen: fen.to_string(),
        max_depth,
        movetime_ms,
    })
}

#[must_use]
pub fn format_report(report: &SearchReport) -> String {
    format!(
        "bestmove {} depth {} eval {} nodes {} time {} tt_hits {} tt_stores {}",
        report.best_move.uci(),
        report.stats.depth,
        report.score,
        report.stats.nodes,
        report.stats.time_ms,
        report.stats.tt_hits,
        report.stats.tt_stores
    )
}
