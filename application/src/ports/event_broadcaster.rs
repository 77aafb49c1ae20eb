//! Event broadcaster port
//!
//! Live-update notifications for connected clients. Events are published
//! strictly after the transaction that caused them has committed, and
//! delivery is best-effort.

use gavel_domain::{Decision, MeetingId, MeetingStatus, MotionId};
use serde::Serialize;
use thiserror::Error;

/// A state change worth pushing to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    MotionOpened {
        meeting: MeetingId,
        motion: MotionId,
    },
    MotionClosed {
        meeting: MeetingId,
        motion: MotionId,
    },
    MeetingStatusChanged {
        meeting: MeetingId,
        from: MeetingStatus,
        to: MeetingStatus,
    },
    ResultsChanged {
        meeting: MeetingId,
        motion: MotionId,
        decision: Decision,
        regenerated: bool,
    },
}

impl GovernanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceEvent::MotionOpened { .. } => "motion_opened",
            GovernanceEvent::MotionClosed { .. } => "motion_closed",
            GovernanceEvent::MeetingStatusChanged { .. } => "meeting_status_changed",
            GovernanceEvent::ResultsChanged { .. } => "results_changed",
        }
    }

    pub fn meeting(&self) -> MeetingId {
        match self {
            GovernanceEvent::MotionOpened { meeting, .. }
            | GovernanceEvent::MotionClosed { meeting, .. }
            | GovernanceEvent::MeetingStatusChanged { meeting, .. }
            | GovernanceEvent::ResultsChanged { meeting, .. } => *meeting,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("No subscriber is listening")]
    NoSubscribers,

    #[error("Broadcast channel closed")]
    Closed,
}

/// Port for publishing governance events
pub trait EventBroadcaster: Send + Sync {
    fn publish(&self, event: GovernanceEvent) -> Result<(), BroadcastError>;
}

/// No-op broadcaster
pub struct NoEventBroadcaster;

impl EventBroadcaster for NoEventBroadcaster {
    fn publish(&self, _event: GovernanceEvent) -> Result<(), BroadcastError> {
        Ok(())
    }
}
