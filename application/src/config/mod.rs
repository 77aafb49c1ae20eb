//! Application-level configuration.
//!
//! - [`EngineConfig`]: tunables the use cases hand to the domain engines

pub mod engine_config;

pub use engine_config::EngineConfig;
