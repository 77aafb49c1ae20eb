//! Meeting setup use cases
//!
//! Creating a meeting, adding motions to its agenda and recording its chair.

use crate::ports::audit_sink::AuditEvent;
use crate::ports::governance_store::GovernanceStore;
use crate::use_cases::shared::{CommandError, GovernanceContext};
use gavel_domain::{
    ActorContext, Capability, Convocation, Meeting, MeetingId, MemberId, Motion, MotionId,
    PolicyId,
};
use serde_json::json;
use tracing::info;

/// Input for the CreateMeeting use case
#[derive(Debug, Clone)]
pub struct CreateMeetingInput {
    pub title: String,
    pub quorum_policy: Option<PolicyId>,
    pub vote_policy: Option<PolicyId>,
    pub convocation: Convocation,
}

impl CreateMeetingInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            quorum_policy: None,
            vote_policy: None,
            convocation: Convocation::First,
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
}

/// Creates a draft meeting
pub struct CreateMeetingUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> CreateMeetingUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: CreateMeetingInput,
    ) -> Result<Meeting, CommandError> {
        actor.authorize(Capability::ManageMeetings)?;
        self.ctx
            .ensure_policies_exist(actor.tenant_id, input.quorum_policy, input.vote_policy)
            .await?;

        let mut meeting = Meeting::new(MeetingId::new(0), actor.tenant_id, input.title)
            .with_policies(input.quorum_policy, input.vote_policy)
            .with_convocation(input.convocation);
        meeting.id = self.ctx.store.insert_meeting(meeting.clone()).await?;

        info!("Created {} \"{}\"", meeting.id, meeting.title);
        self.ctx.audit(AuditEvent::new(
            actor,
            "meeting_created",
            "meeting",
            meeting.id.get(),
            json!({ "title": meeting.title, "convocation": meeting.convocation.number() }),
        ));
        Ok(meeting)
    }
}

/// Input for the AddMotion use case
#[derive(Debug, Clone)]
pub struct AddMotionInput {
    pub meeting: MeetingId,
    pub title: String,
    pub quorum_policy: Option<PolicyId>,
    pub vote_policy: Option<PolicyId>,
}

impl AddMotionInput {
    pub fn new(meeting: MeetingId, title: impl Into<String>) -> Self {
        Self {
            meeting,
            title: title.into(),
            quorum_policy: None,
            vote_policy: None,
        }
    }

    pub fn with_overrides(mut self, quorum: Option<PolicyId>, vote: Option<PolicyId>) -> Self {
        self.quorum_policy = quorum;
        self.vote_policy = vote;
        self
    }
}

/// Adds a pending motion to a meeting's agenda
pub struct AddMotionUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> AddMotionUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: AddMotionInput,
    ) -> Result<Motion, CommandError> {
        actor.authorize(Capability::ManageMeetings)?;
        let snapshot = self
            .ctx
            .store
            .snapshot(actor.tenant_id, input.meeting)
            .await?;
        snapshot.meeting.ensure_mutable()?;
        self.ctx
            .ensure_policies_exist(actor.tenant_id, input.quorum_policy, input.vote_policy)
            .await?;

        let mut motion = Motion::new(MotionId::new(0), input.meeting, input.title)
            .with_policies(input.quorum_policy, input.vote_policy);
        motion.position = snapshot.motions.len() as u32 + 1;
        motion.id = self
            .ctx
            .store
            .insert_motion(actor.tenant_id, motion.clone())
            .await?;

        info!("Added {} to {}", motion.id, input.meeting);
        self.ctx.audit(AuditEvent::new(
            actor,
            "motion_created",
            "motion",
            motion.id.get(),
            json!({ "meeting": input.meeting, "title": motion.title, "position": motion.position }),
        ));
        Ok(motion)
    }
}

/// Records the president (chair) of a meeting
pub struct AssignPresidentUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> AssignPresidentUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        president: MemberId,
    ) -> Result<(), CommandError> {
        actor.authorize(Capability::ManageMeetings)?;
        self.ctx.active_member(actor.tenant_id, president).await?;

        let mut tx = self.ctx.store.begin(actor.tenant_id, meeting).await?;
        let working = tx.working_mut();
        working.meeting.ensure_mutable()?;
        let previous = working.meeting.president.replace(president);
        tx.commit().await?;

        info!("{} presides over {}", president, meeting);
        self.ctx.audit(AuditEvent::new(
            actor,
            "president_assigned",
            "meeting",
            meeting.get(),
            json!({ "president": president, "previous": previous }),
        ));
        Ok(())
    }
}
