//! Motion entity and its frozen official result

use super::ballot::Ballot;
use crate::core::error::GovernanceError;
use crate::core::ids::{MeetingId, MotionId, PolicyId, UserId};
use crate::meeting::Meeting;
use crate::policy::MajorityBase;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a motion stands in its own small lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionStatus {
    Pending,
    Open,
    Closed,
}

impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionStatus::Pending => write!(f, "pending"),
            MotionStatus::Open => write!(f, "open"),
            MotionStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Operator-entered vote count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTally {
    pub total: Decimal,
    #[serde(rename = "for")]
    pub for_weight: Decimal,
    pub against: Decimal,
    pub abstain: Decimal,
    #[serde(default)]
    pub entered_by: Option<UserId>,
}

impl ManualTally {
    pub fn new(total: Decimal, for_weight: Decimal, against: Decimal, abstain: Decimal) -> Self {
        Self {
            total,
            for_weight,
            against,
            abstain,
            entered_by: None,
        }
    }

    /// for + against + abstain, `None` on overflow
    pub fn sum(&self) -> Option<Decimal> {
        self.for_weight
            .checked_add(self.against)?
            .checked_add(self.abstain)
    }

    /// Every count is zero: nothing was actually entered
    pub fn is_blank(&self) -> bool {
        self.counts().iter().all(|(_, value)| value.is_zero())
    }

    /// No negative count, total > 0 and for + against + abstain == total
    pub fn is_consistent(&self) -> bool {
        self.counts().iter().all(|(_, value)| *value >= Decimal::ZERO)
            && self.total > Decimal::ZERO
            && self.sum() == Some(self.total)
    }

    /// Reject a tally that cannot be used as an official source
    pub fn check(&self, motion: MotionId) -> Result<(), GovernanceError> {
        if let Some((field, value)) = self
            .counts()
            .into_iter()
            .find(|(_, value)| *value < Decimal::ZERO)
        {
            return Err(GovernanceError::NegativeManualTally { field, value });
        }
        if self.is_blank() {
            return Err(GovernanceError::NoParticipation(motion));
        }
        let sum = self
            .sum()
            .ok_or(GovernanceError::WeightOverflow("manual tally sum"))?;
        if self.total <= Decimal::ZERO || sum != self.total {
            return Err(GovernanceError::InconsistentManualTally {
                total: self.total,
                sum,
            });
        }
        Ok(())
    }

    fn counts(&self) -> [(&'static str, Decimal); 4] {
        [
            ("total", self.total),
            ("for", self.for_weight),
            ("against", self.against),
            ("abstain", self.abstain),
        ]
    }
}

/// Authoritative source of an official result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Manual,
    Evote,
    None,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Manual => "manual",
            ResultSource::Evote => "evote",
            ResultSource::None => "none",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Adopted,
    Rejected,
    Undetermined,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Adopted => "adopted",
            Decision::Rejected => "rejected",
            Decision::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason behind a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    ThresholdReached,
    ThresholdNotReached,
    TieAdopted,
    TieRejected,
    NoParticipation,
    NoData,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::ThresholdReached => "threshold_reached",
            DecisionReason::ThresholdNotReached => "threshold_not_reached",
            DecisionReason::TieAdopted => "tie_adopted",
            DecisionReason::TieRejected => "tie_rejected",
            DecisionReason::NoParticipation => "no_participation",
            DecisionReason::NoData => "no_data",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frozen official tally of a motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialResult {
    pub source: ResultSource,
    #[serde(rename = "for")]
    pub for_weight: Decimal,
    pub against: Decimal,
    pub abstain: Decimal,
    pub total: Decimal,
    pub decision: Decision,
    pub reason: DecisionReason,
    pub base: Option<MajorityBase>,
    pub base_weight: Decimal,
    pub ratio: Decimal,
    pub threshold: Option<Decimal>,
    pub quorum_met: Option<bool>,
    pub quorum_justification: Option<String>,
    pub justification: String,
    /// Eligibility was presumed from the member roll, not recorded attendance
    pub used_fallback: bool,
    pub consolidated_at: DateTime<Utc>,
    pub regenerations: u32,
}

/// A motion put to the vote during a meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub id: MotionId,
    pub meeting_id: MeetingId,
    pub title: String,
    #[serde(default)]
    pub position: u32,
    /// Overrides the meeting's quorum policy
    #[serde(default)]
    pub quorum_policy: Option<PolicyId>,
    /// Overrides the meeting's vote policy
    #[serde(default)]
    pub vote_policy: Option<PolicyId>,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub opened_by: Option<UserId>,
    pub closed_by: Option<UserId>,
    pub manual_tally: Option<ManualTally>,
    pub official: Option<OfficialResult>,
    #[serde(default)]
    pub archived: bool,
}

impl Motion {
    pub fn new(id: MotionId, meeting_id: MeetingId, title: impl Into<String>) -> Self {
        Self {
            id,
            meeting_id,
            title: title.into(),
            position: 0,
            quorum_policy: None,
            vote_policy: None,
            opened_at: None,
            closed_at: None,
            opened_by: None,
            closed_by: None,
            manual_tally: None,
            official: None,
            archived: false,
        }
    }

    pub fn with_policies(mut self, quorum: Option<PolicyId>, vote: Option<PolicyId>) -> Self {
        self.quorum_policy = quorum;
        self.vote_policy = vote;
        self
    }

    pub fn status(&self) -> MotionStatus {
        match (self.opened_at, self.closed_at) {
            (_, Some(_)) => MotionStatus::Closed,
            (Some(_), None) => MotionStatus::Open,
            (None, None) => MotionStatus::Pending,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == MotionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status() == MotionStatus::Closed
    }

    pub fn effective_quorum_policy(&self, meeting: &Meeting) -> Option<PolicyId> {
        self.quorum_policy.or(meeting.quorum_policy)
    }

    pub fn effective_vote_policy(&self, meeting: &Meeting) -> Option<PolicyId> {
        self.vote_policy.or(meeting.vote_policy)
    }

    pub fn mark_opened(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), GovernanceError> {
        match self.status() {
            MotionStatus::Pending => {
                self.opened_at = Some(at);
                self.opened_by = Some(by);
                Ok(())
            }
            MotionStatus::Open => Err(GovernanceError::AnotherMotionActive {
                meeting: self.meeting_id,
                active: self.id,
            }),
            MotionStatus::Closed => Err(GovernanceError::MotionAlreadyClosed(self.id)),
        }
    }

    pub fn mark_closed(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), GovernanceError> {
        match self.status() {
            MotionStatus::Open => {
                self.closed_at = Some(at);
                self.closed_by = Some(by);
                Ok(())
            }
            MotionStatus::Pending => Err(GovernanceError::MotionNotOpen(self.id)),
            MotionStatus::Closed => Err(GovernanceError::MotionAlreadyClosed(self.id)),
        }
    }

    /// A consistent manual tally or at least one ballot exists
    pub fn has_exploitable_result(&self, ballots: &[Ballot]) -> bool {
        self.manual_tally.as_ref().is_some_and(|t| t.is_consistent())
            || ballots.iter().any(|b| b.motion_id == self.id)
    }

    /// Store a consolidated result unless one is already frozen
    ///
    /// Returns the result now in force.
    pub fn record_official(&mut self, result: OfficialResult) -> &OfficialResult {
        self.official.get_or_insert(result)
    }

    /// Explicit rewrite of the official fields
    pub fn regenerate_official(&mut self, mut result: OfficialResult) -> &OfficialResult {
        result.regenerations = self
            .official
            .as_ref()
            .map_or(0, |previous| previous.regenerations + 1);
        self.official.insert(result)
    }
}
