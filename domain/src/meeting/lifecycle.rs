//! Lifecycle guards
//!
//! Pure checks run by the application layer while it holds the meeting row
//! lock. They decide whether a status transition or a motion opening may
//! proceed; the caller applies the change and commits.
//!
//! ```text
//! draft → scheduled → frozen → live → closed → validated → archived
//!                              ▲
//!            launch ───────────┘ (draft/scheduled/frozen → live, atomically)
//! ```

use super::entities::{Meeting, MeetingStatus};
use crate::core::error::GovernanceError;
use crate::core::ids::MotionId;
use crate::motion::{Ballot, Motion};
use crate::roster::Member;
use std::fmt;

/// Structural problem preventing a meeting from going live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessIssue {
    EmptyTitle,
    NoMotions,
    NoActiveMembers,
}

impl fmt::Display for ReadinessIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessIssue::EmptyTitle => write!(f, "meeting has no title"),
            ReadinessIssue::NoMotions => write!(f, "agenda has no motions"),
            ReadinessIssue::NoActiveMembers => write!(f, "member roll has no active member"),
        }
    }
}

/// Outcome of the workflow readiness check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessReport {
    pub issues: Vec<ReadinessIssue>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_result(self, meeting: &Meeting) -> Result<(), GovernanceError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(GovernanceError::WorkflowNotReady {
                meeting: meeting.id,
                issues: self.issues.iter().map(|i| i.to_string()).collect(),
            })
        }
    }
}

/// Structural readiness only; a president is not required to go live
pub fn check_readiness(meeting: &Meeting, motions: &[Motion], members: &[Member]) -> ReadinessReport {
    let mut issues = Vec::new();
    if meeting.title.trim().is_empty() {
        issues.push(ReadinessIssue::EmptyTitle);
    }
    if !motions.iter().any(|m| m.meeting_id == meeting.id && !m.archived) {
        issues.push(ReadinessIssue::NoMotions);
    }
    if !members.iter().any(|m| m.active) {
        issues.push(ReadinessIssue::NoActiveMembers);
    }
    ReadinessReport { issues }
}

/// Rows a transition guard may need to inspect
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub motions: &'a [Motion],
    pub ballots: &'a [Ballot],
    pub members: &'a [Member],
}

/// The motion currently open on a meeting, if any
pub fn open_motion(meeting: &Meeting, motions: &[Motion]) -> Option<MotionId> {
    meeting.current_motion.or_else(|| {
        motions
            .iter()
            .find(|m| m.meeting_id == meeting.id && m.is_open())
            .map(|m| m.id)
    })
}

/// Check a single-step transition against its guard
pub fn guard_transition(
    meeting: &Meeting,
    target: MeetingStatus,
    ctx: &TransitionContext<'_>,
) -> Result<(), GovernanceError> {
    if !meeting.status.can_transition_to(target) {
        return Err(GovernanceError::InvalidTransition {
            from: meeting.status,
            to: target,
        });
    }

    match target {
        MeetingStatus::Live => check_readiness(meeting, ctx.motions, ctx.members).into_result(meeting),
        MeetingStatus::Closed => match open_motion(meeting, ctx.motions) {
            Some(open) => Err(GovernanceError::MotionStillOpen(open)),
            None => Ok(()),
        },
        MeetingStatus::Validated => {
            if meeting.president.is_none() {
                return Err(GovernanceError::MissingPresident(meeting.id));
            }
            if let Some(open) = open_motion(meeting, ctx.motions) {
                return Err(GovernanceError::MotionStillOpen(open));
            }
            if let Some(motion) = ctx
                .motions
                .iter()
                .filter(|m| m.meeting_id == meeting.id && m.is_closed())
                .find(|m| !m.has_exploitable_result(ctx.ballots))
            {
                return Err(GovernanceError::MotionWithoutResult(motion.id));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Whether the motion's effective policies could be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyAvailability {
    pub quorum: bool,
    pub vote: bool,
}

/// Check-and-set guard for opening a motion
///
/// Must run under the meeting row lock; the caller then marks the motion
/// open and records it as the meeting's current motion in the same
/// transaction.
pub fn guard_open_motion(
    meeting: &Meeting,
    motions: &[Motion],
    target: MotionId,
    policies: PolicyAvailability,
) -> Result<(), GovernanceError> {
    meeting.ensure_mutable()?;

    let motion = motions
        .iter()
        .find(|m| m.id == target && m.meeting_id == meeting.id)
        .ok_or(GovernanceError::UnknownMotion(target))?;

    if let Some(active) = open_motion(meeting, motions) {
        return Err(GovernanceError::AnotherMotionActive {
            meeting: meeting.id,
            active,
        });
    }

    if meeting.status != MeetingStatus::Live {
        return Err(GovernanceError::MeetingNotLive {
            meeting: meeting.id,
            status: meeting.status,
        });
    }

    if motion.is_closed() {
        return Err(GovernanceError::MotionAlreadyClosed(target));
    }

    if !policies.vote {
        return Err(GovernanceError::MissingPolicy {
            motion: target,
            missing: "vote",
        });
    }
    if !policies.quorum {
        return Err(GovernanceError::MissingPolicy {
            motion: target,
            missing: "quorum",
        });
    }

    Ok(())
}
