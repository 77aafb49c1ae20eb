//! Audit configuration from TOML (`[audit]` section)

use serde::{Deserialize, Serialize};

/// Raw audit configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    /// JSONL file receiving audit events; auditing is off when unset
    pub path: Option<String>,
}
