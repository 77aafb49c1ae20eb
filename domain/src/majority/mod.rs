//! Majority evaluation
//!
//! - [`tally::Tallies`]: for / against / abstain / total weights, from ballots or a manual count
//! - [`engine::MajorityEngine`]: decides adopted or rejected under a vote policy

pub mod engine;
pub mod tally;

pub use engine::{MajorityEngine, MajorityOutcome};
pub use tally::{BaseWeights, Tallies};
