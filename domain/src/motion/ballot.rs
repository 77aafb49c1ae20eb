//! Ballots
//!
//! Ballots are append-once. A correction is an explicit deletion (manual
//! ballots only) followed by a fresh insert; `choice` is never mutated.

use crate::core::ids::{MemberId, MotionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotChoice {
    For,
    Against,
    Abstain,
    Blank,
}

impl BallotChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            BallotChoice::For => "for",
            BallotChoice::Against => "against",
            BallotChoice::Abstain => "abstain",
            BallotChoice::Blank => "blank",
        }
    }
}

impl fmt::Display for BallotChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BallotChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "for" | "yes" => Ok(BallotChoice::For),
            "against" | "no" => Ok(BallotChoice::Against),
            "abstain" => Ok(BallotChoice::Abstain),
            "blank" => Ok(BallotChoice::Blank),
            other => Err(format!(
                "Unknown ballot choice: {}. Valid: for, against, abstain, blank",
                other
            )),
        }
    }
}

/// Where a ballot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotSource {
    #[default]
    Electronic,
    /// Entered by an operator on the member's behalf
    Manual,
}

/// One member's vote on one motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    pub motion_id: MotionId,
    /// Member whose vote this is
    pub member_id: MemberId,
    pub choice: BallotChoice,
    /// Weight snapshot taken when the ballot was cast
    pub weight: Decimal,
    pub source: BallotSource,
    pub is_proxy: bool,
    /// Proxy holder who submitted the ballot, for proxy votes
    pub cast_by: Option<MemberId>,
    pub cast_at: DateTime<Utc>,
}

impl Ballot {
    pub fn new(
        motion_id: MotionId,
        member_id: MemberId,
        choice: BallotChoice,
        weight: Decimal,
    ) -> Self {
        Self {
            motion_id,
            member_id,
            choice,
            weight,
            source: BallotSource::Electronic,
            is_proxy: false,
            cast_by: None,
            cast_at: Utc::now(),
        }
    }

    pub fn manual(mut self) -> Self {
        self.source = BallotSource::Manual;
        self
    }

    pub fn by_proxy(mut self, holder: MemberId) -> Self {
        self.is_proxy = true;
        self.cast_by = Some(holder);
        self
    }
}
