//! Meeting scenario files
//!
//! A scenario is a TOML description of one meeting that the command-line
//! front end replays through the engine.

mod file;
mod loader;

pub use file::{
    Scenario, ScenarioAttendance, ScenarioBallot, ScenarioMeeting, ScenarioMember, ScenarioMotion,
    ScenarioProxy, ScenarioQuorumPolicy, ScenarioTally, ScenarioVotePolicy,
};
pub use loader::{ScenarioError, ScenarioLoader};
