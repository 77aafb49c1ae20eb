//! Voting use cases
//!
//! Ballots are appended without taking the meeting lock; the store's
//! uniqueness constraint on `(motion, member)` is the only guard against
//! double voting. Eligibility and weight come from a roster resolved when
//! the ballot is cast.

use crate::ports::audit_sink::AuditEvent;
use crate::ports::governance_store::GovernanceStore;
use crate::use_cases::shared::{CommandError, GovernanceContext};
use gavel_domain::{
    ActorContext, Ballot, BallotChoice, BallotSource, Capability, EligibilityPath,
    GovernanceError, ManualTally, MeetingId, MemberId, MotionId, MotionStatus,
};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info};

/// Input for the CastBallot use case
#[derive(Debug, Clone)]
pub struct CastBallotInput {
    pub meeting: MeetingId,
    pub motion: MotionId,
    /// Member whose vote this is
    pub member: MemberId,
    pub choice: BallotChoice,
    pub source: BallotSource,
    /// Proxy holder casting on the member's behalf
    pub cast_by: Option<MemberId>,
}

impl CastBallotInput {
    pub fn new(meeting: MeetingId, motion: MotionId, member: MemberId, choice: BallotChoice) -> Self {
        Self {
            meeting,
            motion,
            member,
            choice,
            source: BallotSource::Electronic,
            cast_by: None,
        }
    }

    /// Operator-entered ballot
    pub fn manual(mut self) -> Self {
        self.source = BallotSource::Manual;
        self
    }

    pub fn by_proxy(mut self, holder: MemberId) -> Self {
        self.cast_by = Some(holder);
        self
    }
}

/// Casts one ballot
///
/// Electronic ballots are accepted only on the open motion. Manual ballots
/// may also be entered on a closed motion; they reach the official result
/// through regeneration.
pub struct CastBallotUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> CastBallotUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: CastBallotInput,
    ) -> Result<Ballot, CommandError> {
        match input.source {
            BallotSource::Electronic => actor.authorize(Capability::CastBallot)?,
            BallotSource::Manual => actor.authorize(Capability::EnterManualVotes)?,
        }

        let snapshot = self
            .ctx
            .store
            .snapshot(actor.tenant_id, input.meeting)
            .await?;
        snapshot.meeting.ensure_mutable()?;
        let motion = snapshot
            .motion(input.motion)
            .ok_or(GovernanceError::UnknownMotion(input.motion))?;
        match (motion.status(), input.source) {
            (MotionStatus::Open, _) | (MotionStatus::Closed, BallotSource::Manual) => {}
            _ => return Err(GovernanceError::MotionNotOpen(input.motion).into()),
        }

        let roster = self
            .ctx
            .roster(actor.tenant_id, &snapshot.attendance, &snapshot.proxies)
            .await?;
        let resolved = roster
            .get(input.member)
            .ok_or(GovernanceError::UnknownMember(input.member))?;
        if !resolved.eligible {
            return Err(GovernanceError::NotEligible {
                member: input.member,
                reason: format!(
                    "attendance is {} and no attending proxy holder",
                    resolved.attendance.as_str()
                ),
            }
            .into());
        }

        match (input.cast_by, resolved.path) {
            (Some(holder), EligibilityPath::Proxy { holder: active }) if holder == active => {}
            (Some(holder), _) => {
                return Err(GovernanceError::NotEligible {
                    member: input.member,
                    reason: format!("{} does not hold an active proxy for this member", holder),
                }
                .into());
            }
            (None, EligibilityPath::Proxy { holder })
                if input.source == BallotSource::Electronic =>
            {
                return Err(GovernanceError::NotEligible {
                    member: input.member,
                    reason: format!("represented by {}; the proxy holder casts this vote", holder),
                }
                .into());
            }
            (None, _) => {}
        }

        let mut ballot = Ballot::new(
            input.motion,
            input.member,
            input.choice,
            resolved.effective_weight,
        );
        if input.source == BallotSource::Manual {
            ballot = ballot.manual();
        }
        if let Some(holder) = input.cast_by {
            ballot = ballot.by_proxy(holder);
        }

        self.ctx
            .store
            .append_ballot(actor.tenant_id, input.meeting, ballot.clone())
            .await?;

        debug!(
            "{} voted {} on {} (weight {})",
            input.member, input.choice, input.motion, ballot.weight
        );
        if ballot.source == BallotSource::Manual {
            self.ctx.audit(AuditEvent::new(
                actor,
                "manual_ballot_entered",
                "motion",
                input.motion.get(),
                json!({ "member": input.member, "choice": input.choice, "weight": ballot.weight }),
            ));
        }
        Ok(ballot)
    }
}

/// Deletes a manual ballot so it can be re-entered
pub struct DeleteManualBallotUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> DeleteManualBallotUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
        member: MemberId,
        justification: &str,
    ) -> Result<Ballot, CommandError> {
        actor.authorize(Capability::EnterManualVotes)?;
        if justification.trim().is_empty() {
            return Err(GovernanceError::MissingJustification.into());
        }

        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        snapshot.meeting.ensure_mutable()?;
        let ballot = snapshot
            .ballot(motion, member)
            .ok_or(GovernanceError::BallotNotFound { motion, member })?;
        if ballot.source != BallotSource::Manual {
            return Err(GovernanceError::BallotNotCorrectable { motion, member }.into());
        }

        let deleted = self
            .ctx
            .store
            .delete_ballot(actor.tenant_id, meeting, motion, member)
            .await?;

        info!("Deleted manual ballot of {} on {}", member, motion);
        self.ctx.audit(AuditEvent::new(
            actor,
            "manual_ballot_deleted",
            "motion",
            motion.get(),
            json!({
                "member": member,
                "choice": deleted.choice,
                "weight": deleted.weight,
                "justification": justification.trim(),
            }),
        ));
        Ok(deleted)
    }
}

/// Input for the RecordManualTally use case
#[derive(Debug, Clone)]
pub struct RecordManualTallyInput {
    pub meeting: MeetingId,
    pub motion: MotionId,
    pub total: Decimal,
    pub for_weight: Decimal,
    pub against: Decimal,
    pub abstain: Decimal,
}

/// Records an operator-entered count for a motion
///
/// Negative, inconsistent or all-zero counts are rejected before anything is
/// written.
pub struct RecordManualTallyUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> RecordManualTallyUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: RecordManualTallyInput,
    ) -> Result<ManualTally, CommandError> {
        actor.authorize(Capability::EnterManualVotes)?;
        let mut tally =
            ManualTally::new(input.total, input.for_weight, input.against, input.abstain);
        tally.entered_by = Some(actor.user_id);
        tally.check(input.motion)?;

        let mut tx = self.ctx.store.begin(actor.tenant_id, input.meeting).await?;
        let working = tx.working_mut();
        working.meeting.ensure_mutable()?;
        let motion = working
            .motion_mut(input.motion)
            .ok_or(GovernanceError::UnknownMotion(input.motion))?;
        if motion.status() == MotionStatus::Pending {
            return Err(GovernanceError::MotionNotOpen(input.motion).into());
        }
        motion.manual_tally = Some(tally.clone());
        tx.commit().await?;

        info!(
            "Manual tally on {}: {} for, {} against, {} abstain of {}",
            input.motion, tally.for_weight, tally.against, tally.abstain, tally.total
        );
        self.ctx.audit(AuditEvent::new(
            actor,
            "manual_tally_recorded",
            "motion",
            input.motion.get(),
            json!(tally),
        ));
        Ok(tally)
    }
}
