//! Session settings.

use serde::{Deserialize, Serialize};

use super::role::DEFAULT_BLACK_ON_TOP;

/// Default for animating moves that arrive live.
pub const DEFAULT_ANIMATE_MOVES: bool = true;

/// Client session settings, loadable from JSON.
///
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Orientation of a fresh board
    pub black_on_top: bool,

    /// Animate live moves (replay steps forward always animate)
    pub animate_moves: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            black_on_top: DEFAULT_BLACK_ON_TOP,
            animate_moves: DEFAULT_ANIMATE_MOVES,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
