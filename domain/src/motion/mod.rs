//! Motions and ballots

pub mod ballot;
pub mod entities;

pub use ballot::{Ballot, BallotChoice, BallotSource};
pub use entities::{
    Decision, DecisionReason, ManualTally, Motion, MotionStatus, OfficialResult, ResultSource,
};
