//! Domain error types
//!
//! Every failure the engine can report is a variant of [`GovernanceError`].
//! Each variant maps to a stable machine-readable kind and an
//! [`ErrorCategory`] so boundary layers can translate it without string
//! matching.

use super::ids::{MeetingId, MemberId, MotionId, PolicyId};
use crate::meeting::MeetingStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller-correctable input; never retried
    Validation,
    /// Lost race or attempt to mutate frozen state
    Conflict,
    /// Business-rule violation in the data itself
    Consistency,
    /// Storage, lock or timeout failure
    Infrastructure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Consistency => "consistency",
            ErrorCategory::Infrastructure => "infrastructure",
        }
    }
}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    // ==================== Validation ====================
    #[error("Invalid proxy: {reason}")]
    InvalidProxy { reason: String },

    #[error("Proxy chain not allowed: {giver} cannot delegate to {receiver} ({reason})")]
    ProxyChainNotAllowed {
        giver: MemberId,
        receiver: MemberId,
        reason: String,
    },

    #[error("{receiver} already holds {ceiling} active proxies (ceiling reached)")]
    ProxyCeilingExceeded { receiver: MemberId, ceiling: usize },

    #[error("{motion} has no resolvable {missing} policy")]
    MissingPolicy {
        motion: MotionId,
        missing: &'static str,
    },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: MeetingStatus, to: MeetingStatus },

    #[error("{meeting} is not ready to go live: {}", .issues.join("; "))]
    WorkflowNotReady {
        meeting: MeetingId,
        issues: Vec<String>,
    },

    #[error("{member} is not eligible to vote: {reason}")]
    NotEligible { member: MemberId, reason: String },

    #[error("A justification is required for this correction")]
    MissingJustification,

    #[error("Ballot of {member} on {motion} is electronic and cannot be corrected")]
    BallotNotCorrectable { motion: MotionId, member: MemberId },

    #[error("No ballot from {member} on {motion}")]
    BallotNotFound { motion: MotionId, member: MemberId },

    #[error("Unknown meeting: {0}")]
    UnknownMeeting(MeetingId),

    #[error("Unknown motion: {0}")]
    UnknownMotion(MotionId),

    #[error("Unknown member: {0}")]
    UnknownMember(MemberId),

    #[error("Unknown policy: {0}")]
    UnknownPolicy(PolicyId),

    // ==================== Conflict ====================
    #[error("Another motion is active on {meeting}: {active}")]
    AnotherMotionActive { meeting: MeetingId, active: MotionId },

    #[error("{meeting} is validated; its records are locked")]
    MeetingValidatedLocked { meeting: MeetingId },

    #[error("{meeting} is {status}, not live")]
    MeetingNotLive {
        meeting: MeetingId,
        status: MeetingStatus,
    },

    #[error("{0} is already closed")]
    MotionAlreadyClosed(MotionId),

    #[error("{0} is not open")]
    MotionNotOpen(MotionId),

    #[error("{0} is not closed")]
    MotionNotClosed(MotionId),

    #[error("{0} is still open")]
    MotionStillOpen(MotionId),

    #[error("{0} has no president recorded")]
    MissingPresident(MeetingId),

    #[error("{0} has neither a consistent manual tally nor any ballot")]
    MotionWithoutResult(MotionId),

    #[error("{member} has already voted on {motion}")]
    DuplicateBallot { motion: MotionId, member: MemberId },

    // ==================== Consistency ====================
    #[error("Inconsistent manual tally: for + against + abstain = {sum}, total = {total}")]
    InconsistentManualTally { total: Decimal, sum: Decimal },

    #[error("Manual tally {field} is negative: {value}")]
    NegativeManualTally { field: &'static str, value: Decimal },

    #[error("Weight arithmetic overflowed computing the {0}")]
    WeightOverflow(&'static str),

    #[error("No participation recorded on {0}")]
    NoParticipation(MotionId),
}

impl GovernanceError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceError::InvalidProxy { .. } => "invalid_proxy",
            GovernanceError::ProxyChainNotAllowed { .. } => "proxy_chain_not_allowed",
            GovernanceError::ProxyCeilingExceeded { .. } => "proxy_ceiling_exceeded",
            GovernanceError::MissingPolicy { .. } => "missing_policy",
            GovernanceError::InvalidTransition { .. } => "invalid_transition",
            GovernanceError::WorkflowNotReady { .. } => "workflow_not_ready",
            GovernanceError::NotEligible { .. } => "not_eligible",
            GovernanceError::MissingJustification => "missing_justification",
            GovernanceError::BallotNotCorrectable { .. } => "ballot_not_correctable",
            GovernanceError::BallotNotFound { .. } => "ballot_not_found",
            GovernanceError::UnknownMeeting(_) => "unknown_meeting",
            GovernanceError::UnknownMotion(_) => "unknown_motion",
            GovernanceError::UnknownMember(_) => "unknown_member",
            GovernanceError::UnknownPolicy(_) => "unknown_policy",
            GovernanceError::AnotherMotionActive { .. } => "another_motion_active",
            GovernanceError::MeetingValidatedLocked { .. } => "meeting_validated_locked",
            GovernanceError::MeetingNotLive { .. } => "meeting_not_live",
            GovernanceError::MotionAlreadyClosed(_) => "motion_already_closed",
            GovernanceError::MotionNotOpen(_) => "motion_not_open",
            GovernanceError::MotionNotClosed(_) => "motion_not_closed",
            GovernanceError::MotionStillOpen(_) => "motion_still_open",
            GovernanceError::MissingPresident(_) => "missing_president",
            GovernanceError::MotionWithoutResult(_) => "motion_without_result",
            GovernanceError::DuplicateBallot { .. } => "duplicate_ballot",
            GovernanceError::InconsistentManualTally { .. } => "inconsistent_manual_tally",
            GovernanceError::NegativeManualTally { .. } => "negative_manual_tally",
            GovernanceError::WeightOverflow(_) => "weight_overflow",
            GovernanceError::NoParticipation(_) => "no_participation",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GovernanceError::InvalidProxy { .. }
            | GovernanceError::ProxyChainNotAllowed { .. }
            | GovernanceError::ProxyCeilingExceeded { .. }
            | GovernanceError::MissingPolicy { .. }
            | GovernanceError::InvalidTransition { .. }
            | GovernanceError::WorkflowNotReady { .. }
            | GovernanceError::NotEligible { .. }
            | GovernanceError::MissingJustification
            | GovernanceError::BallotNotCorrectable { .. }
            | GovernanceError::BallotNotFound { .. }
            | GovernanceError::UnknownMeeting(_)
            | GovernanceError::UnknownMotion(_)
            | GovernanceError::UnknownMember(_)
            | GovernanceError::UnknownPolicy(_) => ErrorCategory::Validation,

            GovernanceError::AnotherMotionActive { .. }
            | GovernanceError::MeetingValidatedLocked { .. }
            | GovernanceError::MeetingNotLive { .. }
            | GovernanceError::MotionAlreadyClosed(_)
            | GovernanceError::MotionNotOpen(_)
            | GovernanceError::MotionNotClosed(_)
            | GovernanceError::MotionStillOpen(_)
            | GovernanceError::MissingPresident(_)
            | GovernanceError::MotionWithoutResult(_)
            | GovernanceError::DuplicateBallot { .. } => ErrorCategory::Conflict,

            GovernanceError::InconsistentManualTally { .. }
            | GovernanceError::NegativeManualTally { .. }
            | GovernanceError::WeightOverflow(_)
            | GovernanceError::NoParticipation(_) => ErrorCategory::Consistency,
        }
    }

    /// Human-readable justification, prefixed with the machine kind
    pub fn justification(&self) -> String {
        format!("[{}] {}", self.kind(), self)
    }

    /// Competing motion id for lost open races
    pub fn competing_motion(&self) -> Option<MotionId> {
        match self {
            GovernanceError::AnotherMotionActive { active, .. } => Some(*active),
            _ => None,
        }
    }
}
