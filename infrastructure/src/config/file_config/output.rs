//! `[output]` section: how the meeting report is printed

use gavel_domain::OutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// `full`, `summary` or `json`; the `--output` flag takes precedence
    pub format: Option<OutputFormat>,
    /// Colored terminal output (never applied to JSON)
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}
