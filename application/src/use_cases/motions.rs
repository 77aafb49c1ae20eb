//! Motion control use cases
//!
//! Opening and closing a motion run entirely under the meeting row lock:
//!
//! ```text
//! begin(meeting) ──► guard ──► mark opened/closed ──► (close: consolidate) ──► commit
//!                                                                               │
//!                                          audit + broadcast (best-effort) ◄────┘
//! ```
//!
//! Two concurrent opens on the same meeting serialize on the lock; the loser
//! observes the winner's committed state and fails with
//! [`GovernanceError::AnotherMotionActive`].

use crate::ports::audit_sink::AuditEvent;
use crate::ports::event_broadcaster::GovernanceEvent;
use crate::ports::governance_store::GovernanceStore;
use crate::use_cases::shared::{
    CommandError, ConsolidationMode, GovernanceContext, MotionPolicies, consolidate_in,
};
use chrono::Utc;
use gavel_domain::{
    ActorContext, Capability, GovernanceError, MeetingId, MotionId, OfficialResult,
    PolicyAvailability, guard_open_motion,
};
use serde_json::json;
use tracing::info;

/// Opens a motion for voting
pub struct OpenMotionUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> OpenMotionUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
    ) -> Result<(), CommandError> {
        actor.authorize(Capability::ControlMotions)?;

        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working();
        let policies = match working.motion(motion) {
            Some(target) => self.ctx.policies(&working.meeting, target).await?,
            None => MotionPolicies::default(),
        };
        guard_open_motion(
            &working.meeting,
            &working.motions,
            motion,
            PolicyAvailability {
                quorum: policies.quorum.is_some(),
                vote: policies.vote.is_some(),
            },
        )?;

        let working = tx.working_mut();
        working
            .motion_mut(motion)
            .ok_or(GovernanceError::UnknownMotion(motion))?
            .mark_opened(actor.user_id, Utc::now())?;
        working.meeting.current_motion = Some(motion);
        tx.commit().await?;

        info!("Opened {} on {}", motion, meeting);
        self.ctx.audit(AuditEvent::new(
            actor,
            "motion_opened",
            "motion",
            motion.get(),
            json!({ "meeting": meeting }),
        ));
        self.ctx
            .publish(GovernanceEvent::MotionOpened { meeting, motion });
        Ok(())
    }
}

/// Closes the open motion and freezes its official result
///
/// Closing and consolidation commit together: if the result cannot be
/// consolidated (for example an inconsistent manual tally) the motion stays
/// open.
pub struct CloseMotionUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> CloseMotionUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
    ) -> Result<OfficialResult, CommandError> {
        actor.authorize(Capability::ControlMotions)?;

        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working();
        working.meeting.ensure_mutable()?;
        let target = working
            .motion(motion)
            .ok_or(GovernanceError::UnknownMotion(motion))?;
        let policies = self.ctx.policies(&working.meeting, target).await?;
        let roster = self
            .ctx
            .roster(actor.tenant_id, &working.attendance, &working.proxies)
            .await?;

        let now = Utc::now();
        let working = tx.working_mut();
        working
            .motion_mut(motion)
            .ok_or(GovernanceError::UnknownMotion(motion))?
            .mark_closed(actor.user_id, now)?;
        if working.meeting.current_motion == Some(motion) {
            working.meeting.current_motion = None;
        }
        let consolidation = consolidate_in(
            working,
            motion,
            &roster,
            &policies,
            ConsolidationMode::Freeze,
            now,
        )?;
        tx.commit().await?;

        let result = consolidation.result;
        info!(
            "Closed {} on {}: {} ({}, source {})",
            motion, meeting, result.decision, result.reason, result.source
        );
        self.ctx.audit(AuditEvent::new(
            actor,
            "motion_closed",
            "motion",
            motion.get(),
            json!({ "meeting": meeting }),
        ));
        if consolidation.written {
            self.ctx.audit(AuditEvent::new(
                actor,
                "result_consolidated",
                "motion",
                motion.get(),
                json!(result),
            ));
        }
        self.ctx
            .publish(GovernanceEvent::MotionClosed { meeting, motion });
        self.ctx.publish(GovernanceEvent::ResultsChanged {
            meeting,
            motion,
            decision: result.decision,
            regenerated: false,
        });
        Ok(result)
    }
}
