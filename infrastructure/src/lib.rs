//! Infrastructure layer for gavel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the in-memory governance store, the JSONL
//! audit sink, the broadcast event bus, configuration file loading and
//! scenario files.

pub mod audit;
pub mod config;
pub mod events;
pub mod scenario;
pub mod store;

// Re-export commonly used types
pub use audit::JsonlAuditSink;
pub use config::{
    ConfigLoader, FileAuditConfig, FileConfig, FileEngineConfig, FileEventsConfig,
    FileLoggingConfig, FileOutputConfig,
};
pub use events::BroadcastEventBus;
pub use scenario::{Scenario, ScenarioError, ScenarioLoader};
pub use store::InMemoryGovernanceStore;
