//! Meeting lifecycle use cases
//!
//! Every transition runs its guard and applies the status change while the
//! meeting row lock is held. Audit and broadcast happen after commit.

use crate::ports::audit_sink::AuditEvent;
use crate::ports::event_broadcaster::GovernanceEvent;
use crate::ports::governance_store::GovernanceStore;
use crate::use_cases::shared::{CommandError, ConsolidationMode, GovernanceContext, consolidate_in};
use chrono::Utc;
use gavel_domain::{
    ActorContext, Capability, GovernanceError, MeetingId, MeetingStatus, MotionId,
    OfficialResult, TransitionContext, guard_transition,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// Result of a successful status change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub meeting: MeetingId,
    pub from: MeetingStatus,
    pub to: MeetingStatus,
    /// Statuses walked, in order; a single entry for a plain transition
    pub steps: Vec<MeetingStatus>,
    /// Results frozen by this transition (validation only)
    pub consolidated: Vec<(MotionId, OfficialResult)>,
}

/// Single adjacent status step
///
/// A step into `validated` is delegated to [`ValidateMeetingUseCase`] so
/// missing results get consolidated.
pub struct TransitionMeetingUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> TransitionMeetingUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        target: MeetingStatus,
    ) -> Result<TransitionOutcome, CommandError> {
        if target == MeetingStatus::Validated {
            return ValidateMeetingUseCase::new(self.ctx.clone())
                .execute(actor, meeting)
                .await;
        }
        actor.authorize(Capability::ManageMeetings)?;

        let members = self.ctx.store.members(actor.tenant_id).await?;
        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working();
        guard_transition(
            &working.meeting,
            target,
            &TransitionContext {
                motions: &working.motions,
                ballots: &working.ballots,
                members: &members,
            },
        )?;
        let from = tx
            .working_mut()
            .meeting
            .advance_to(target, actor.user_id, Utc::now())?;
        tx.commit().await?;

        info!("{}: {} -> {}", meeting, from, target);
        let outcome = TransitionOutcome {
            meeting,
            from,
            to: target,
            steps: vec![target],
            consolidated: Vec::new(),
        };
        self.ctx.announce(actor, &outcome);
        Ok(outcome)
    }
}

/// Walks draft, scheduled or frozen up to live in one transaction
pub struct LaunchMeetingUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> LaunchMeetingUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
    ) -> Result<TransitionOutcome, CommandError> {
        actor.authorize(Capability::ManageMeetings)?;

        let members = self.ctx.store.members(actor.tenant_id).await?;
        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let from = tx.working().meeting.status;
        let steps = from
            .launch_path()
            .ok_or(GovernanceError::InvalidTransition {
                from,
                to: MeetingStatus::Live,
            })?;

        let now = Utc::now();
        for step in &steps {
            let working = tx.working_mut();
            guard_transition(
                &working.meeting,
                *step,
                &TransitionContext {
                    motions: &working.motions,
                    ballots: &working.ballots,
                    members: &members,
                },
            )?;
            working.meeting.advance_to(*step, actor.user_id, now)?;
            debug!("{}: launch step to {}", meeting, step);
        }
        tx.commit().await?;

        info!("{} launched: {} -> live", meeting, from);
        let outcome = TransitionOutcome {
            meeting,
            from,
            to: MeetingStatus::Live,
            steps,
            consolidated: Vec::new(),
        };
        self.ctx.announce(actor, &outcome);
        Ok(outcome)
    }
}

/// Closed to validated, freezing every missing official result
///
/// After commit the meeting's ballots, proxies, attendance and results are
/// read-only.
pub struct ValidateMeetingUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> ValidateMeetingUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
    ) -> Result<TransitionOutcome, CommandError> {
        actor.authorize(Capability::ValidateMeeting)?;

        let members = self.ctx.store.members(actor.tenant_id).await?;
        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working();
        guard_transition(
            &working.meeting,
            MeetingStatus::Validated,
            &TransitionContext {
                motions: &working.motions,
                ballots: &working.ballots,
                members: &members,
            },
        )?;

        let roster = self
            .ctx
            .resolve(&members, &working.attendance, &working.proxies)?;
        let mut pending = Vec::new();
        for motion in working
            .motions
            .iter()
            .filter(|m| m.is_closed() && m.official.is_none())
        {
            pending.push((motion.id, self.ctx.policies(&working.meeting, motion).await?));
        }

        let now = Utc::now();
        let mut consolidated = Vec::new();
        for (motion, policies) in &pending {
            let consolidation = consolidate_in(
                tx.working_mut(),
                *motion,
                &roster,
                policies,
                ConsolidationMode::Freeze,
                now,
            )?;
            consolidated.push((*motion, consolidation.result));
        }
        let from = tx
            .working_mut()
            .meeting
            .advance_to(MeetingStatus::Validated, actor.user_id, now)?;
        tx.commit().await?;

        info!(
            "{} validated ({} result(s) consolidated)",
            meeting,
            consolidated.len()
        );
        for (motion, result) in &consolidated {
            self.ctx.audit(AuditEvent::new(
                actor,
                "result_consolidated",
                "motion",
                motion.get(),
                json!(result),
            ));
            self.ctx.publish(GovernanceEvent::ResultsChanged {
                meeting,
                motion: *motion,
                decision: result.decision,
                regenerated: false,
            });
        }
        let outcome = TransitionOutcome {
            meeting,
            from,
            to: MeetingStatus::Validated,
            steps: vec![MeetingStatus::Validated],
            consolidated,
        };
        self.ctx.announce(actor, &outcome);
        Ok(outcome)
    }
}

impl<S: GovernanceStore + 'static> GovernanceContext<S> {
    fn announce(&self, actor: &ActorContext, outcome: &TransitionOutcome) {
        self.audit(AuditEvent::new(
            actor,
            "meeting_status_changed",
            "meeting",
            outcome.meeting.get(),
            json!({ "from": outcome.from, "to": outcome.to, "steps": outcome.steps }),
        ));
        self.publish(GovernanceEvent::MeetingStatusChanged {
            meeting: outcome.meeting,
            from: outcome.from,
            to: outcome.to,
        });
    }
}
