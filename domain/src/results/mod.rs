//! Official results
//!
//! The consolidator is the only code that writes a motion's
//! [`OfficialResult`](crate::motion::OfficialResult).

pub mod consolidator;

pub use consolidator::{Consolidation, ConsolidationContext, OfficialResultsConsolidator};
