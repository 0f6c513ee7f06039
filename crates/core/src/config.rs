//! Engine configuration, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorConfig;
use crate::error::BackdropError;
use crate::frame_loop::DEFAULT_MAX_STEP;

/// Tuning for [`Engine`](crate::Engine). Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest physics step per frame, in seconds.
    pub max_frame_step: f64,
    /// Quiet period after the last resize event before the grid is rebuilt.
    pub resize_debounce_ms: f64,
    /// Extra cells added to each grid dimension so contours reach the edges.
    pub cell_padding: usize,
    pub cursor: CursorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frame_step: DEFAULT_MAX_STEP,
            resize_debounce_ms: 200.0,
            cell_padding: 2,
            cursor: CursorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BackdropError> {
        serde_json::from_str(json).map_err(|e| BackdropError::InvalidConfig(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, BackdropError> {
        serde_json::to_string_pretty(self).map_err(|e| BackdropError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_frame_step, 0.05);
        assert_eq!(cfg.resize_debounce_ms, 200.0);
        assert_eq!(cfg.cell_padding, 2);
        assert_eq!(cfg.cursor.max_trail, 6);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"resize_debounce_ms": 50, "cursor": {"spring_damping": 30}}"#)
            .unwrap();
        assert_eq!(cfg.resize_debounce_ms, 50.0);
        assert_eq!(cfg.cursor.spring_damping, 30.0);
        assert_eq!(cfg.cursor.spring_stiffness, 140.0);
        assert_eq!(cfg.max_frame_step, 0.05);
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, BackdropError::InvalidConfig(_)));
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let cfg = EngineConfig {
            cell_padding: 4,
            ..EngineConfig::default()
        };
        let back = EngineConfig::from_json_str(&cfg.to_json_string().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
