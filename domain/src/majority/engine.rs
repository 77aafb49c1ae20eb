//! Majority engine
//!
//! Decides whether a motion passes from its tallies. The engine is a pure
//! function: it never reads storage and never persists.
//!
//! | base            | measured against                                     |
//! |-----------------|------------------------------------------------------|
//! | `expressed`     | for + against (+ abstain when it counts as against)  |
//! | `total_members` | base weight of every active member on the roll       |
//! | `present`       | weight of every eligible member                      |

use super::tally::{BaseWeights, Tallies};
use crate::core::error::GovernanceError;
use crate::motion::{Decision, DecisionReason};
use crate::policy::{MajorityBase, TieRule, VotePolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a majority evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityOutcome {
    pub decision: Decision,
    pub reason: DecisionReason,
    pub base: MajorityBase,
    pub base_weight: Decimal,
    pub ratio: Decimal,
    pub threshold: Decimal,
    /// Against weight after abstentions were folded in
    pub effective_against: Decimal,
    pub justification: String,
}

/// Stateless majority evaluator
pub struct MajorityEngine;

impl MajorityEngine {
    /// Fails only when the weights are too large to add or divide
    pub fn evaluate(
        tallies: &Tallies,
        bases: BaseWeights,
        policy: &VotePolicy,
    ) -> Result<MajorityOutcome, GovernanceError> {
        let effective_against = if policy.abstention_as_against {
            tallies
                .against
                .checked_add(tallies.abstain)
                .ok_or(GovernanceError::WeightOverflow("effective against weight"))?
        } else {
            tallies.against
        };

        let base_weight = match policy.base {
            MajorityBase::Expressed => tallies
                .for_weight
                .checked_add(effective_against)
                .ok_or(GovernanceError::WeightOverflow("expressed base"))?,
            MajorityBase::TotalMembers => bases.total_members,
            MajorityBase::Present => bases.present,
        };

        let (ratio, decision, reason) = if base_weight <= Decimal::ZERO {
            (
                Decimal::ZERO,
                Decision::Rejected,
                DecisionReason::NoParticipation,
            )
        } else {
            let ratio = tallies
                .for_weight
                .checked_div(base_weight)
                .ok_or(GovernanceError::WeightOverflow("majority ratio"))?;
            let (decision, reason) = if ratio > policy.threshold {
                (Decision::Adopted, DecisionReason::ThresholdReached)
            } else if ratio == policy.threshold {
                match policy.tie_rule {
                    TieRule::Adopt => (Decision::Adopted, DecisionReason::TieAdopted),
                    TieRule::Reject => (Decision::Rejected, DecisionReason::TieRejected),
                }
            } else {
                (Decision::Rejected, DecisionReason::ThresholdNotReached)
            };
            (ratio, decision, reason)
        };

        let justification = if reason == DecisionReason::NoParticipation {
            format!(
                "{} base is zero; {} ({})",
                policy.base, decision, reason
            )
        } else {
            format!(
                "{} base: for {} / base {} = ratio {} against threshold {} -> {} ({})",
                policy.base,
                tallies.for_weight.normalize(),
                base_weight.normalize(),
                ratio.round_dp(4).normalize(),
                policy.threshold.normalize(),
                decision,
                reason
            )
        };

        Ok(MajorityOutcome {
            decision,
            reason,
            base: policy.base,
            base_weight,
            ratio,
            threshold: policy.threshold,
            effective_against,
            justification,
        })
    }
}
