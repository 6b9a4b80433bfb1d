use serde::{Deserialize, Serialize};

/// Search and ordering knobs. The defaults are the values the engine
/// ships with; deployments override individual fields through JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tt_size_mb: usize,

    // Iterative deepening
    pub aspiration_window: i32,

    // Move ordering scores
    pub score_tt_move: i32,
    pub score_capture_base: i32,
    pub score_promotion_base: i32,
    pub score_killer_primary: i32,
    pub score_killer_secondary: i32,
    pub history_limit: i32,

    // Quiescence
    pub delta_margin: i32,
    pub bad_capture_threshold: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tt_size_mb: 64,
            aspiration_window: 50,
            score_tt_move: 10_000_000,
            score_capture_base: 5_000_000,
            score_promotion_base: 4_500_000,
            score_killer_primary: 4_000_000,
            score_killer_secondary: 3_900_000,
            history_limit: 1_000_000,
            delta_margin: 900,
            bad_capture_threshold: -200,
        }
    }
}

impl EngineConfig {
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::load_from_json("{}").unwrap();
        assert_eq!(config.tt_size_mb, 64);
        assert_eq!(config.score_tt_move, 10_000_000);
        assert_eq!(config.aspiration_window, 50);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = EngineConfig::load_from_json(
            r#"{
                "tt_size_mb": 16,
                "aspiration_window": 25
            }"#,
        )
        .unwrap();
        assert_eq!(config.tt_size_mb, 16);
        assert_eq!(config.aspiration_window, 25);
        // Everything else keeps its default
        assert_eq!(config.delta_margin, 900);
        assert_eq!(config.score_killer_primary, 4_000_000);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(EngineConfig::load_from_json("{ invalid json }").is_err());
    }
}
