//! Quorum evaluation
//!
//! Quorum answers "is this assembly procedurally able to decide". It is
//! computed from a resolved [`Roster`](crate::roster::Roster) and a
//! [`QuorumPolicy`](crate::policy::QuorumPolicy); the result never blocks a
//! decision by itself and is stored on the official result for the record.

pub mod engine;

pub use engine::{QuorumEngine, QuorumEvaluation};
