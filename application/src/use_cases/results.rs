//! Result and reporting use cases
//!
//! Reads never write: a motion without a stored result gets a provisional
//! computation flagged as such. The only write here is the explicit,
//! audited regeneration.

use crate::ports::audit_sink::AuditEvent;
use crate::ports::event_broadcaster::GovernanceEvent;
use crate::ports::governance_store::{GovernanceStore, MeetingSnapshot};
use crate::use_cases::shared::{
    CommandError, ConsolidationMode, GovernanceContext, consolidate_in,
};
use chrono::Utc;
use gavel_domain::{
    ActorContext, Capability, Convocation, EligibilityPath, GovernanceError, MeetingId,
    MeetingStatus, MemberId, MotionId, MotionStatus, OfficialResult, OfficialResultsConsolidator,
    QuorumEngine, QuorumEvaluation, Roster,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Official result of a motion as currently known
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub motion: MotionId,
    pub result: OfficialResult,
    /// Computed on the fly; nothing is stored yet
    pub provisional: bool,
}

/// Recomputes and overwrites a frozen result
pub struct RegenerateResultUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> RegenerateResultUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
        reason: &str,
    ) -> Result<OfficialResult, CommandError> {
        actor.authorize(Capability::RegenerateResults)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GovernanceError::MissingJustification.into());
        }

        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working();
        working.meeting.ensure_mutable()?;
        let target = working
            .motion(motion)
            .ok_or(GovernanceError::UnknownMotion(motion))?;
        let previous = target.official.clone();
        let policies = self.ctx.policies(&working.meeting, target).await?;
        let roster = self
            .ctx
            .roster(actor.tenant_id, &working.attendance, &working.proxies)
            .await?;

        let consolidation = consolidate_in(
            tx.working_mut(),
            motion,
            &roster,
            &policies,
            ConsolidationMode::Regenerate,
            Utc::now(),
        )?;
        tx.commit().await?;

        let result = consolidation.result;
        info!(
            "Regenerated result of {}: {} (regeneration #{})",
            motion, result.decision, result.regenerations
        );
        self.ctx.audit(AuditEvent::new(
            actor,
            "result_regenerated",
            "motion",
            motion.get(),
            json!({
                "meeting": meeting,
                "reason": reason,
                "previous": previous,
                "result": result,
            }),
        ));
        self.ctx.publish(GovernanceEvent::ResultsChanged {
            meeting,
            motion,
            decision: result.decision,
            regenerated: true,
        });
        Ok(result)
    }
}

/// Stored result, or a provisional one computed without writing
pub struct GetOfficialResultUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> GetOfficialResultUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
    ) -> Result<ResultView, CommandError> {
        actor.authorize(Capability::ReadResults)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        let roster = self
            .ctx
            .roster(actor.tenant_id, &snapshot.attendance, &snapshot.proxies)
            .await?;
        self.ctx.view(&snapshot, motion, &roster).await
    }
}

/// Live quorum for a meeting, or for one motion's effective policy
pub struct EvaluateQuorumUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> EvaluateQuorumUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        motion: Option<MotionId>,
    ) -> Result<QuorumEvaluation, CommandError> {
        actor.authorize(Capability::ReadResults)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        let roster = self
            .ctx
            .roster(actor.tenant_id, &snapshot.attendance, &snapshot.proxies)
            .await?;
        let policy = match motion {
            Some(id) => {
                let target = snapshot
                    .motion(id)
                    .ok_or(GovernanceError::UnknownMotion(id))?;
                self.ctx.policies(&snapshot.meeting, target).await?.quorum
            }
            None => self.ctx.meeting_quorum_policy(&snapshot.meeting).await?,
        };
        Ok(QuorumEngine::evaluate(
            &roster,
            snapshot.meeting.convocation,
            policy.as_ref(),
        ))
    }
}

/// Head counts of a resolved roster
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub members: usize,
    pub present: usize,
    pub remote: usize,
    pub represented: usize,
    pub absent: usize,
    pub roll_weight: Decimal,
    pub eligible_weight: Decimal,
    pub used_fallback: bool,
}

impl AttendanceSummary {
    pub fn from_roster(roster: &Roster) -> Self {
        let mut summary = Self {
            members: roster.len(),
            roll_weight: roster.roll_weight(),
            eligible_weight: roster.eligible_weight(),
            used_fallback: roster.used_fallback(),
            ..Default::default()
        };
        for member in roster.iter() {
            match member.path {
                EligibilityPath::Direct => summary.present += 1,
                EligibilityPath::Remote => summary.remote += 1,
                EligibilityPath::Proxy { .. } => summary.represented += 1,
                EligibilityPath::Ineligible => summary.absent += 1,
            }
        }
        summary
    }
}

/// One agenda line of a meeting report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionReport {
    pub id: MotionId,
    pub position: u32,
    pub title: String,
    pub status: MotionStatus,
    pub result: Option<OfficialResult>,
    pub provisional: bool,
    /// Why no result could be computed
    pub error: Option<String>,
}

/// Meeting status, live quorum and every motion with its result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingReport {
    pub id: MeetingId,
    pub title: String,
    pub status: MeetingStatus,
    pub convocation: Convocation,
    pub president: Option<MemberId>,
    pub validated: bool,
    pub attendance: AttendanceSummary,
    pub quorum: QuorumEvaluation,
    pub motions: Vec<MotionReport>,
}

pub struct GetMeetingReportUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> GetMeetingReportUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
    ) -> Result<MeetingReport, CommandError> {
        actor.authorize(Capability::ReadResults)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        let roster = self
            .ctx
            .roster(actor.tenant_id, &snapshot.attendance, &snapshot.proxies)
            .await?;
        let quorum_policy = self.ctx.meeting_quorum_policy(&snapshot.meeting).await?;

        let mut agenda: Vec<_> = snapshot.motions.iter().filter(|m| !m.archived).collect();
        agenda.sort_by_key(|m| (m.position, m.id));

        let mut motions = Vec::with_capacity(agenda.len());
        for motion in agenda {
            let (result, provisional, error) =
                match self.ctx.view(&snapshot, motion.id, &roster).await {
                    Ok(view) => (Some(view.result), view.provisional, None),
                    Err(e) => (None, false, Some(e.justification())),
                };
            motions.push(MotionReport {
                id: motion.id,
                position: motion.position,
                title: motion.title.clone(),
                status: motion.status(),
                result,
                provisional,
                error,
            });
        }

        let meeting = &snapshot.meeting;
        Ok(MeetingReport {
            id: meeting.id,
            title: meeting.title.clone(),
            status: meeting.status,
            convocation: meeting.convocation,
            president: meeting.president,
            validated: meeting.is_validated(),
            attendance: AttendanceSummary::from_roster(&roster),
            quorum: QuorumEngine::evaluate(&roster, meeting.convocation, quorum_policy.as_ref()),
            motions,
        })
    }
}

impl<S: GovernanceStore + 'static> GovernanceContext<S> {
    async fn view(
        &self,
        snapshot: &MeetingSnapshot,
        motion: MotionId,
        roster: &Roster,
    ) -> Result<ResultView, CommandError> {
        let target = snapshot
            .motion(motion)
            .ok_or(GovernanceError::UnknownMotion(motion))?;
        let policies = self.policies(&snapshot.meeting, target).await?;
        let (result, provisional) = OfficialResultsConsolidator::current(
            target,
            policies.context(&snapshot.meeting, &snapshot.ballots, roster),
            Utc::now(),
        )?;
        Ok(ResultView {
            motion,
            result,
            provisional,
        })
    }
}
