//! Engine configuration from TOML (`[engine]` section)

use gavel_application::EngineConfig;
use gavel_domain::roster::DEFAULT_PROXY_CEILING;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw engine configuration from TOML
///
/// ```toml
/// [engine]
/// proxy_ceiling = 3
/// fallback_all_active_when_unrecorded = false
/// lock_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Maximum active proxies one receiver may hold per meeting
    pub proxy_ceiling: usize,
    /// Presume all active members present when no attendance is recorded
    pub fallback_all_active_when_unrecorded: bool,
    /// How long a transition waits for a meeting row lock
    pub lock_timeout_ms: Option<u64>,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            proxy_ceiling: DEFAULT_PROXY_CEILING,
            fallback_all_active_when_unrecorded: false,
            lock_timeout_ms: Some(5_000),
        }
    }
}

impl FileEngineConfig {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_proxy_ceiling(self.proxy_ceiling)
            .with_fallback(self.fallback_all_active_when_unrecorded)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_engine_config() {
        let file = FileEngineConfig {
            proxy_ceiling: 3,
            fallback_all_active_when_unrecorded: true,
            lock_timeout_ms: None,
        };
        let engine = file.to_engine_config();
        assert_eq!(engine.proxy_ceiling, 3);
        assert!(engine.fallback_all_active_when_unrecorded);
        assert_eq!(file.lock_timeout(), None);
    }

    #[test]
    fn test_default_lock_timeout() {
        assert_eq!(
            FileEngineConfig::default().lock_timeout(),
            Some(Duration::from_secs(5))
        );
    }
}
