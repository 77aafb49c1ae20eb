//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod audit;
mod engine;
mod events;
mod logging;
mod output;

pub use audit::FileAuditConfig;
pub use engine::FileEngineConfig;
pub use events::{DEFAULT_EVENT_CAPACITY, FileEventsConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;

use gavel_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Roster resolution and locking
    pub engine: FileEngineConfig,
    /// Audit trail destination
    pub audit: FileAuditConfig,
    /// Live event bus
    pub events: FileEventsConfig,
    /// Diagnostic log file
    pub logging: FileLoggingConfig,
    /// Report output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.engine.proxy_ceiling == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroProxyCeiling,
                "engine.proxy_ceiling is 0: no proxy could ever be assigned",
            ));
        }
        if self.engine.fallback_all_active_when_unrecorded {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::FallbackEligibilityEnabled,
                "engine.fallback_all_active_when_unrecorded is on: meetings without attendance \
                 presume every active member present",
            ));
        }
        if self.events.capacity == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroEventCapacity,
                "events.capacity must be at least 1",
            ));
        }
        for (field, value) in [
            ("audit.path", &self.audit.path),
            ("logging.file", &self.logging.file),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyPath,
                    format!("{} is set but empty", field),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[engine]
proxy_ceiling = 3
fallback_all_active_when_unrecorded = true
lock_timeout_ms = 250

[audit]
path = "audit/gavel.jsonl"

[events]
capacity = 16

[logging]
file = "gavel.log"

[output]
format = "full"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.proxy_ceiling, 3);
        assert!(config.engine.fallback_all_active_when_unrecorded);
        assert_eq!(config.engine.lock_timeout_ms, Some(250));
        assert_eq!(config.audit.path.as_deref(), Some("audit/gavel.jsonl"));
        assert_eq!(config.events.capacity, 16);
        assert_eq!(config.logging.file.as_deref(), Some("gavel.log"));
        assert_eq!(config.output.format, Some(gavel_domain::OutputFormat::Full));
        assert!(!config.output.color);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[engine]
proxy_ceiling = 4
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.proxy_ceiling, 4);
        // Defaults should apply
        assert!(!config.engine.fallback_all_active_when_unrecorded);
        assert_eq!(config.events.capacity, DEFAULT_EVENT_CAPACITY);
        assert!(config.audit.path.is_none());
        assert!(config.output.color);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FileConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let toml_str = r#"
[engine]
proxy_ceiling = 0
fallback_all_active_when_unrecorded = true

[events]
capacity = 0

[audit]
path = "  "
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::ZeroProxyCeiling,
                ConfigIssueCode::FallbackEligibilityEnabled,
                ConfigIssueCode::ZeroEventCapacity,
                ConfigIssueCode::EmptyPath,
            ]
        );
        let errors = config.validate().iter().filter(|i| i.is_error()).count();
        assert_eq!(errors, 3);
    }
}
