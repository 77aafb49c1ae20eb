//! Engine configuration: tunables for roster resolution.
//!
//! [`EngineConfig`] carries the deployment-configured values the domain
//! engines need. These are application-layer concerns, not policy rows:
//! they apply to every meeting of the deployment.

use gavel_domain::roster::{DEFAULT_PROXY_CEILING, RosterOptions};
use serde::{Deserialize, Serialize};

/// Engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum simultaneously active proxies one receiver may hold.
    pub proxy_ceiling: usize,
    /// Presume every active member present when a meeting has no attendance rows.
    pub fallback_all_active_when_unrecorded: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            proxy_ceiling: DEFAULT_PROXY_CEILING,
            fallback_all_active_when_unrecorded: false,
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_proxy_ceiling(mut self, ceiling: usize) -> Self {
        self.proxy_ceiling = ceiling;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_all_active_when_unrecorded = enabled;
        self
    }

    pub fn roster_options(&self) -> RosterOptions {
        RosterOptions {
            proxy_ceiling: self.proxy_ceiling,
            fallback_all_active_when_unrecorded: self.fallback_all_active_when_unrecorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling() {
        let config = EngineConfig::default();
        assert_eq!(config.proxy_ceiling, DEFAULT_PROXY_CEILING);
        assert!(!config.fallback_all_active_when_unrecorded);
    }

    #[test]
    fn test_builder_feeds_roster_options() {
        let options = EngineConfig::default()
            .with_proxy_ceiling(3)
            .with_fallback(true)
            .roster_options();
        assert_eq!(options.proxy_ceiling, 3);
        assert!(options.fallback_all_active_when_unrecorded);
    }
}
