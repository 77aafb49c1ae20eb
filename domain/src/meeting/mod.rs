//! Meeting lifecycle
//!
//! - [`entities::Meeting`]: the meeting row and its status machine
//! - [`lifecycle`]: guards for transitions and for opening a motion

pub mod entities;
pub mod lifecycle;

pub use entities::{Convocation, Meeting, MeetingStatus};
pub use lifecycle::{
    PolicyAvailability, ReadinessIssue, ReadinessReport, TransitionContext, check_readiness,
    guard_open_motion, guard_transition, open_motion,
};
