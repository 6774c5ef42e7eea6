//! Tracker view and interaction settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::quest::GroupBy;

/// Defaults for the quest board.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Default grouping dimension for tabs.
    #[serde(default)]
    pub group_by: GroupBy,
    /// Confirmation window for completion toggles (milliseconds).
    #[serde(default = "default_confirm_window_ms")]
    pub confirm_window_ms: u64,
}

const fn default_confirm_window_ms() -> u64 {
    3000
}

impl TrackerConfig {
    #[must_use]
    pub fn confirm_window(&self) -> Duration {
        Duration::from_millis(self.confirm_window_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            confirm_window_ms: default_confirm_window_ms(),
        }
    }
}
