//! Attendance and proxy use cases
//!
//! These write read-mostly rows outside the meeting lock. Proxy changes are
//! validated by the [`ProxyResolver`](gavel_domain::ProxyResolver) against
//! the proxies in force when the request started, then again by the store
//! against the rows present at write time.

use crate::ports::audit_sink::AuditEvent;
use crate::ports::governance_store::GovernanceStore;
use crate::use_cases::shared::{CommandError, GovernanceContext};
use chrono::Utc;
use gavel_domain::{
    ActorContext, Attendance, AttendanceMode, Capability, GovernanceError, MeetingId, MemberId,
    Proxy,
};
use serde_json::json;
use tracing::{debug, info};

/// Records (or corrects) how a member attends a meeting
pub struct RecordAttendanceUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> RecordAttendanceUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        member: MemberId,
        mode: AttendanceMode,
    ) -> Result<Attendance, CommandError> {
        actor.authorize(Capability::RecordAttendance)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        snapshot.meeting.ensure_mutable()?;
        self.ctx.active_member(actor.tenant_id, member).await?;

        let attendance = Attendance::new(meeting, member, mode);
        self.ctx
            .store
            .upsert_attendance(actor.tenant_id, attendance.clone())
            .await?;

        debug!("{} attends {} as {}", member, meeting, mode.as_str());
        self.ctx.audit(AuditEvent::new(
            actor,
            "attendance_recorded",
            "meeting",
            meeting.get(),
            json!({ "member": member, "mode": mode }),
        ));
        Ok(attendance)
    }
}

/// Delegates a giver's vote to a receiver for one meeting
///
/// A new assignment from the same giver replaces the previous one.
pub struct AssignProxyUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> AssignProxyUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        giver: MemberId,
        receiver: MemberId,
    ) -> Result<Proxy, CommandError> {
        actor.authorize(Capability::ManageProxies)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        snapshot.meeting.ensure_mutable()?;
        self.ctx.active_member(actor.tenant_id, giver).await?;
        self.ctx.active_member(actor.tenant_id, receiver).await?;

        let proxy = Proxy::new(meeting, giver, receiver);
        let rules = self.ctx.resolver();
        rules.validate_assignment(&proxy, &snapshot.proxies)?;
        self.ctx
            .store
            .upsert_proxy(actor.tenant_id, proxy.clone(), rules)
            .await?;

        info!("{} delegates to {} for {}", giver, receiver, meeting);
        self.ctx.audit(AuditEvent::new(
            actor,
            "proxy_assigned",
            "proxy",
            meeting.get(),
            json!({ "giver": giver, "receiver": receiver }),
        ));
        Ok(proxy)
    }
}

/// Revokes a giver's active proxy; effective immediately
pub struct RevokeProxyUseCase<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
}

impl<S: GovernanceStore + 'static> RevokeProxyUseCase<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        meeting: MeetingId,
        giver: MemberId,
    ) -> Result<Proxy, CommandError> {
        actor.authorize(Capability::ManageProxies)?;
        let snapshot = self.ctx.store.snapshot(actor.tenant_id, meeting).await?;
        snapshot.meeting.ensure_mutable()?;

        let revoked = self
            .ctx
            .store
            .revoke_proxy(actor.tenant_id, meeting, giver, Utc::now())
            .await?
            .ok_or_else(|| GovernanceError::InvalidProxy {
                reason: format!("{} has no active proxy on {}", giver, meeting),
            })?;

        info!("{} revoked the proxy to {}", giver, revoked.receiver);
        self.ctx.audit(AuditEvent::new(
            actor,
            "proxy_revoked",
            "proxy",
            meeting.get(),
            json!({ "giver": giver, "receiver": revoked.receiver }),
        ));
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::use_cases::testing::{TENANT, World, operator};

    fn m(id: u64) -> MemberId {
        MemberId::new(id)
    }

    #[tokio::test]
    async fn test_record_attendance_upserts() {
        let world = World::new(2, 1).await;
        let use_case = RecordAttendanceUseCase::new(world.ctx.clone());
        use_case
            .execute(&operator(), world.meeting, m(1), AttendanceMode::Absent)
            .await
            .unwrap();
        use_case
            .execute(&operator(), world.meeting, m(1), AttendanceMode::Present)
            .await
            .unwrap();

        let snapshot = world.snapshot().await;
        assert_eq!(snapshot.attendance.len(), 1);
        assert_eq!(snapshot.attendance[0].mode, AttendanceMode::Present);
        assert_eq!(
            world.audit.actions(),
            vec!["attendance_recorded", "attendance_recorded"]
        );
    }

    #[tokio::test]
    async fn test_self_delegation_is_refused() {
        let world = World::new(2, 1).await;
        let err = AssignProxyUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(1), m(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_proxy");
        assert!(world.snapshot().await.proxies.is_empty());
    }

    #[tokio::test]
    async fn test_ceiling_then_revoke_frees_a_slot() {
        let mut world = World::new(6, 1).await;
        world.ctx = world
            .ctx
            .clone()
            .with_config(EngineConfig::default().with_proxy_ceiling(3));
        let assign = AssignProxyUseCase::new(world.ctx.clone());
        let revoke = RevokeProxyUseCase::new(world.ctx.clone());

        for giver in 2..=4 {
            assign
                .execute(&operator(), world.meeting, m(giver), m(1))
                .await
                .unwrap();
        }
        let err = assign
            .execute(&operator(), world.meeting, m(5), m(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "proxy_ceiling_exceeded");

        revoke.execute(&operator(), world.meeting, m(2)).await.unwrap();
        assign
            .execute(&operator(), world.meeting, m(5), m(1))
            .await
            .unwrap();

        let active = world
            .snapshot()
            .await
            .proxies
            .iter()
            .filter(|p| p.is_active())
            .count();
        assert_eq!(active, 3);
    }

    #[tokio::test]
    async fn test_chain_is_refused() {
        let world = World::new(3, 1).await;
        let assign = AssignProxyUseCase::new(world.ctx.clone());
        assign
            .execute(&operator(), world.meeting, m(1), m(2))
            .await
            .unwrap();
        let err = assign
            .execute(&operator(), world.meeting, m(2), m(3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "proxy_chain_not_allowed");
    }

    #[tokio::test]
    async fn test_reassignment_replaces_previous_proxy() {
        let world = World::new(3, 1).await;
        let assign = AssignProxyUseCase::new(world.ctx.clone());
        assign
            .execute(&operator(), world.meeting, m(1), m(2))
            .await
            .unwrap();
        assign
            .execute(&operator(), world.meeting, m(1), m(3))
            .await
            .unwrap();

        let snapshot = world.snapshot().await;
        let active: Vec<_> = snapshot.proxies.iter().filter(|p| p.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].receiver, m(3));
    }

    #[tokio::test]
    async fn test_revoke_without_proxy() {
        let world = World::new(2, 1).await;
        let err = RevokeProxyUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_proxy");
    }

    #[tokio::test]
    async fn test_validated_meeting_refuses_attendance_and_proxies() {
        let world = World::new(3, 1).await;
        AssignProxyUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(1), m(2))
            .await
            .unwrap();
        let mut tx = world.ctx.store.begin(TENANT, world.meeting).await.unwrap();
        tx.working_mut().meeting.validated_at = Some(Utc::now());
        tx.commit().await.unwrap();

        let err = RecordAttendanceUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(1), AttendanceMode::Present)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "meeting_validated_locked");

        let err = AssignProxyUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(3), m(2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "meeting_validated_locked");

        let err = RevokeProxyUseCase::new(world.ctx.clone())
            .execute(&operator(), world.meeting, m(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "meeting_validated_locked");
    }
}
