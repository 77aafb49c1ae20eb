//! Vote tallies

use crate::core::ids::MotionId;
use crate::motion::{Ballot, BallotChoice, ManualTally};
use crate::roster::Roster;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Weighted vote counts for one motion
///
/// `total` includes blank ballots, which never reach any majority base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tallies {
    #[serde(rename = "for")]
    pub for_weight: Decimal,
    pub against: Decimal,
    pub abstain: Decimal,
    pub total: Decimal,
}

impl Tallies {
    pub fn new(for_weight: Decimal, against: Decimal, abstain: Decimal, total: Decimal) -> Self {
        Self {
            for_weight,
            against,
            abstain,
            total,
        }
    }

    /// Aggregate the weight snapshots of the ballots cast on `motion`
    pub fn from_ballots(motion: MotionId, ballots: &[Ballot]) -> Self {
        ballots
            .iter()
            .filter(|b| b.motion_id == motion)
            .fold(Self::default(), |mut acc, ballot| {
                match ballot.choice {
                    BallotChoice::For => acc.for_weight += ballot.weight,
                    BallotChoice::Against => acc.against += ballot.weight,
                    BallotChoice::Abstain => acc.abstain += ballot.weight,
                    BallotChoice::Blank => {}
                }
                acc.total += ballot.weight;
                acc
            })
    }

    pub fn from_manual(tally: &ManualTally) -> Self {
        Self {
            for_weight: tally.for_weight,
            against: tally.against,
            abstain: tally.abstain,
            total: tally.total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_zero()
    }
}

/// Roster-derived weights used by the `total_members` and `present` bases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub total_members: Decimal,
    pub present: Decimal,
}

impl BaseWeights {
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            total_members: roster.roll_weight(),
            present: roster.eligible_weight(),
        }
    }
}
