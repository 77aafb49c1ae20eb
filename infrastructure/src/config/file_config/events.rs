//! Event bus configuration from TOML (`[events]` section)

use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Raw event bus configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEventsConfig {
    /// Events buffered per subscriber before the slowest one lags
    pub capacity: usize,
}

impl Default for FileEventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
