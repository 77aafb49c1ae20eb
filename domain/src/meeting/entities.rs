//! Meeting entity and status machine

use crate::core::error::GovernanceError;
use crate::core::ids::{MeetingId, MemberId, MotionId, PolicyId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Meeting status, in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    #[default]
    Draft,
    Scheduled,
    Frozen,
    Live,
    Closed,
    Validated,
    Archived,
}

impl MeetingStatus {
    /// The single status reachable from this one
    pub fn next(&self) -> Option<MeetingStatus> {
        match self {
            MeetingStatus::Draft => Some(MeetingStatus::Scheduled),
            MeetingStatus::Scheduled => Some(MeetingStatus::Frozen),
            MeetingStatus::Frozen => Some(MeetingStatus::Live),
            MeetingStatus::Live => Some(MeetingStatus::Closed),
            MeetingStatus::Closed => Some(MeetingStatus::Validated),
            MeetingStatus::Validated => Some(MeetingStatus::Archived),
            MeetingStatus::Archived => None,
        }
    }

    pub fn can_transition_to(&self, target: MeetingStatus) -> bool {
        self.next() == Some(target)
    }

    /// Statuses walked by a launch from here to `live`
    pub fn launch_path(&self) -> Option<Vec<MeetingStatus>> {
        if *self > MeetingStatus::Frozen {
            return None;
        }
        let mut path = Vec::new();
        let mut current = *self;
        while current != MeetingStatus::Live {
            current = current.next()?;
            path.push(current);
        }
        Some(path)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Draft => "draft",
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Frozen => "frozen",
            MeetingStatus::Live => "live",
            MeetingStatus::Closed => "closed",
            MeetingStatus::Validated => "validated",
            MeetingStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(MeetingStatus::Draft),
            "scheduled" => Ok(MeetingStatus::Scheduled),
            "frozen" => Ok(MeetingStatus::Frozen),
            "live" => Ok(MeetingStatus::Live),
            "closed" => Ok(MeetingStatus::Closed),
            "validated" => Ok(MeetingStatus::Validated),
            "archived" => Ok(MeetingStatus::Archived),
            other => Err(format!("Unknown meeting status: {}", other)),
        }
    }
}

/// Which call of the assembly is in session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convocation {
    #[default]
    First,
    Second,
}

impl Convocation {
    pub fn number(&self) -> u8 {
        match self {
            Convocation::First => 1,
            Convocation::Second => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Convocation::First),
            2 => Some(Convocation::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Convocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convocation::First => write!(f, "first call"),
            Convocation::Second => write!(f, "second call"),
        }
    }
}

/// A formal assembly session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub tenant_id: TenantId,
    pub title: String,
    pub status: MeetingStatus,
    pub quorum_policy: Option<PolicyId>,
    pub vote_policy: Option<PolicyId>,
    pub convocation: Convocation,
    /// The open motion, if any
    pub current_motion: Option<MotionId>,
    pub president: Option<MemberId>,
    pub started_at: Option<DateTime<Utc>>,
    pub opened_by: Option<UserId>,
    pub closed_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Meeting {
    pub fn new(id: MeetingId, tenant_id: TenantId, title: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            title: title.into(),
            status: MeetingStatus::Draft,
            quorum_policy: None,
            vote_policy: None,
            convocation: Convocation::First,
            current_motion: None,
            president: None,
            started_at: None,
            opened_by: None,
            closed_at: None,
            validated_at: None,
            archived_at: None,
        }
    }

    pub fn with_policies(mut self, quorum: Option<PolicyId>, vote: Option<PolicyId>) -> Self {
        self.quorum_policy = quorum;
        self.vote_policy = vote;
        self
    }

    pub fn with_convocation(mut self, convocation: Convocation) -> Self {
        self.convocation = convocation;
        self
    }

    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }

    /// Fails once the meeting's records are frozen
    pub fn ensure_mutable(&self) -> Result<(), GovernanceError> {
        if self.is_validated() {
            Err(GovernanceError::MeetingValidatedLocked { meeting: self.id })
        } else {
            Ok(())
        }
    }

    /// Apply a single adjacent status step and stamp its timestamps
    ///
    /// Guards that need motions, ballots or members live in
    /// [`super::lifecycle`]; this only enforces adjacency.
    pub fn advance_to(
        &mut self,
        target: MeetingStatus,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<MeetingStatus, GovernanceError> {
        if !self.status.can_transition_to(target) {
            return Err(GovernanceError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        let previous = self.status;
        match target {
            MeetingStatus::Live => {
                self.started_at.get_or_insert(at);
                self.opened_by = Some(by);
            }
            MeetingStatus::Closed => self.closed_at = Some(at),
            MeetingStatus::Validated => self.validated_at = Some(at),
            MeetingStatus::Archived => self.archived_at = Some(at),
            _ => {}
        }
        self.status = target;
        Ok(previous)
    }
}
