//! In-memory doubles for use case tests.

use crate::ports::audit_sink::{AuditError, AuditEvent, AuditSink};
use crate::ports::event_broadcaster::{BroadcastError, EventBroadcaster, GovernanceEvent};
use crate::ports::governance_store::{
    GovernanceStore, MeetingSnapshot, MeetingTransaction, StoreError,
};
use crate::use_cases::shared::GovernanceContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gavel_domain::{
    ActorContext, Attendance, Ballot, DenominatorKind, GovernanceError, MajorityBase, Meeting,
    MeetingId, Member, MemberId, Motion, MotionId, PolicyId, Proxy, ProxyResolver, QuorumPolicy,
    Role, TenantId, UserId, VotePolicy,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

pub(crate) const TENANT: TenantId = TenantId::new(1);
pub(crate) const QUORUM_POLICY: PolicyId = PolicyId::new(1);
pub(crate) const VOTE_POLICY: PolicyId = PolicyId::new(2);

#[derive(Default)]
struct Data {
    next_id: u64,
    meetings: BTreeMap<MeetingId, Meeting>,
    motions: Vec<Motion>,
    ballots: Vec<(MeetingId, Ballot)>,
    attendance: Vec<Attendance>,
    proxies: Vec<Proxy>,
    members: Vec<Member>,
    quorum_policies: Vec<QuorumPolicy>,
    vote_policies: Vec<VotePolicy>,
}

impl Data {
    fn meeting(&self, tenant: TenantId, id: MeetingId) -> Result<&Meeting, StoreError> {
        self.meetings
            .get(&id)
            .filter(|m| m.tenant_id == tenant)
            .ok_or(StoreError::Rule(GovernanceError::UnknownMeeting(id)))
    }

    fn writable(&self, tenant: TenantId, id: MeetingId) -> Result<(), StoreError> {
        Ok(self.meeting(tenant, id)?.ensure_mutable()?)
    }

    fn snapshot(&self, tenant: TenantId, id: MeetingId) -> Result<MeetingSnapshot, StoreError> {
        Ok(MeetingSnapshot {
            meeting: self.meeting(tenant, id)?.clone(),
            motions: self
                .motions
                .iter()
                .filter(|m| m.meeting_id == id)
                .cloned()
                .collect(),
            ballots: self
                .ballots
                .iter()
                .filter(|(m, _)| *m == id)
                .map(|(_, b)| b.clone())
                .collect(),
            attendance: self
                .attendance
                .iter()
                .filter(|a| a.meeting_id == id)
                .cloned()
                .collect(),
            proxies: self
                .proxies
                .iter()
                .filter(|p| p.meeting_id == id)
                .cloned()
                .collect(),
        })
    }
}

/// Single-lock store; enough to exercise use case logic
#[derive(Default)]
pub(crate) struct MockStore {
    data: Arc<Mutex<Data>>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

struct MockTransaction {
    _guard: OwnedMutexGuard<()>,
    data: Arc<Mutex<Data>>,
    working: MeetingSnapshot,
}

#[async_trait]
impl MeetingTransaction for MockTransaction {
    fn working(&self) -> &MeetingSnapshot {
        &self.working
    }

    fn working_mut(&mut self) -> &mut MeetingSnapshot {
        &mut self.working
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.meetings
            .insert(self.working.meeting.id, self.working.meeting.clone());
        for motion in &self.working.motions {
            if let Some(row) = data.motions.iter_mut().find(|m| m.id == motion.id) {
                *row = motion.clone();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GovernanceStore for MockStore {
    async fn begin(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<Box<dyn MeetingTransaction>, StoreError> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let working = self.data.lock().unwrap().snapshot(tenant, meeting)?;
        Ok(Box::new(MockTransaction {
            _guard: guard,
            data: Arc::clone(&self.data),
            working,
        }))
    }

    async fn snapshot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<MeetingSnapshot, StoreError> {
        self.data.lock().unwrap().snapshot(tenant, meeting)
    }

    async fn members(&self, tenant: TenantId) -> Result<Vec<Member>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .members
            .iter()
            .filter(|m| m.tenant_id == tenant)
            .cloned()
            .collect())
    }

    async fn quorum_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<QuorumPolicy>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .quorum_policies
            .iter()
            .find(|p| p.id == id && p.tenant_id == tenant)
            .cloned())
    }

    async fn vote_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<VotePolicy>, StoreError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .vote_policies
            .iter()
            .find(|p| p.id == id && p.tenant_id == tenant)
            .cloned())
    }

    async fn insert_meeting(&self, mut meeting: Meeting) -> Result<MeetingId, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.next_id += 1;
        meeting.id = MeetingId::new(data.next_id);
        let id = meeting.id;
        data.meetings.insert(id, meeting);
        Ok(id)
    }

    async fn insert_motion(
        &self,
        tenant: TenantId,
        mut motion: Motion,
    ) -> Result<MotionId, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, motion.meeting_id)?;
        data.next_id += 1;
        motion.id = MotionId::new(data.next_id);
        let id = motion.id;
        data.motions.push(motion);
        Ok(id)
    }

    async fn upsert_attendance(
        &self,
        tenant: TenantId,
        attendance: Attendance,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, attendance.meeting_id)?;
        data.attendance.retain(|a| {
            !(a.meeting_id == attendance.meeting_id && a.member_id == attendance.member_id)
        });
        data.attendance.push(attendance);
        Ok(())
    }

    async fn upsert_proxy(
        &self,
        tenant: TenantId,
        proxy: Proxy,
        rules: ProxyResolver,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, proxy.meeting_id)?;
        rules.validate_assignment(&proxy, &data.proxies)?;
        let now = proxy.granted_at;
        for existing in data.proxies.iter_mut().filter(|p| {
            p.meeting_id == proxy.meeting_id && p.giver == proxy.giver && p.is_active()
        }) {
            existing.revoke(now);
        }
        data.proxies.push(proxy);
        Ok(())
    }

    async fn revoke_proxy(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        giver: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Proxy>, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, meeting)?;
        Ok(data
            .proxies
            .iter_mut()
            .find(|p| p.meeting_id == meeting && p.giver == giver && p.is_active())
            .map(|p| {
                p.revoke(at);
                p.clone()
            }))
    }

    async fn append_ballot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        ballot: Ballot,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, meeting)?;
        if data
            .ballots
            .iter()
            .any(|(_, b)| b.motion_id == ballot.motion_id && b.member_id == ballot.member_id)
        {
            return Err(GovernanceError::DuplicateBallot {
                motion: ballot.motion_id,
                member: ballot.member_id,
            }
            .into());
        }
        data.ballots.push((meeting, ballot));
        Ok(())
    }

    async fn delete_ballot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        motion: MotionId,
        member: MemberId,
    ) -> Result<Ballot, StoreError> {
        let mut data = self.data.lock().unwrap();
        data.writable(tenant, meeting)?;
        let index = data
            .ballots
            .iter()
            .position(|(_, b)| b.motion_id == motion && b.member_id == member)
            .ok_or(StoreError::Rule(GovernanceError::BallotNotFound {
                motion,
                member,
            }))?;
        Ok(data.ballots.remove(index).1)
    }

    async fn insert_member(&self, member: Member) -> Result<(), StoreError> {
        self.data.lock().unwrap().members.push(member);
        Ok(())
    }

    async fn insert_quorum_policy(&self, policy: QuorumPolicy) -> Result<(), StoreError> {
        self.data.lock().unwrap().quorum_policies.push(policy);
        Ok(())
    }

    async fn insert_vote_policy(&self, policy: VotePolicy) -> Result<(), StoreError> {
        self.data.lock().unwrap().vote_policies.push(policy);
        Ok(())
    }
}

/// Audit sink that keeps events in memory, optionally failing every write
#[derive(Default)]
pub(crate) struct RecordingAudit {
    pub events: Mutex<Vec<AuditEvent>>,
    pub fail: bool,
}

impl RecordingAudit {
    pub fn actions(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        if self.fail {
            return Err(AuditError::Unavailable("disk full".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Broadcaster that keeps events in memory, optionally failing every publish
#[derive(Default)]
pub(crate) struct RecordingEvents {
    pub events: Mutex<Vec<GovernanceEvent>>,
    pub fail: bool,
}

impl RecordingEvents {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl EventBroadcaster for RecordingEvents {
    fn publish(&self, event: GovernanceEvent) -> Result<(), BroadcastError> {
        if self.fail {
            return Err(BroadcastError::NoSubscribers);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub(crate) fn operator() -> ActorContext {
    ActorContext::new(UserId::new(100), Role::Operator, TENANT)
}

pub(crate) fn admin() -> ActorContext {
    ActorContext::new(UserId::new(1), Role::Admin, TENANT)
}

/// A seeded world: members, policies, and a draft meeting with motions
pub(crate) struct World {
    pub ctx: GovernanceContext<MockStore>,
    pub audit: Arc<RecordingAudit>,
    pub events: Arc<RecordingEvents>,
    pub meeting: MeetingId,
    pub motions: Vec<MotionId>,
}

impl World {
    pub async fn new(members: u64, motions: usize) -> Self {
        Self::with(members, motions, RecordingAudit::default(), RecordingEvents::default()).await
    }

    pub async fn with(
        members: u64,
        motions: usize,
        audit: RecordingAudit,
        events: RecordingEvents,
    ) -> Self {
        let store = Arc::new(MockStore::default());
        for id in 1..=members {
            store
                .insert_member(Member::new(
                    MemberId::new(id),
                    TENANT,
                    format!("Member {}", id),
                    Decimal::ONE,
                ))
                .await
                .unwrap();
        }
        store
            .insert_quorum_policy(QuorumPolicy::new(
                QUORUM_POLICY,
                TENANT,
                DenominatorKind::EligibleMembers,
                Decimal::new(5, 1),
            ))
            .await
            .unwrap();
        store
            .insert_vote_policy(VotePolicy::new(
                VOTE_POLICY,
                TENANT,
                MajorityBase::Expressed,
                Decimal::new(5, 1),
            ))
            .await
            .unwrap();

        let meeting = store
            .insert_meeting(
                Meeting::new(MeetingId::new(0), TENANT, "Annual general meeting")
                    .with_policies(Some(QUORUM_POLICY), Some(VOTE_POLICY)),
            )
            .await
            .unwrap();
        let mut motion_ids = Vec::new();
        for i in 0..motions {
            let id = store
                .insert_motion(
                    TENANT,
                    Motion::new(MotionId::new(0), meeting, format!("Resolution {}", i + 1)),
                )
                .await
                .unwrap();
            motion_ids.push(id);
        }

        let audit = Arc::new(audit);
        let events = Arc::new(events);
        let ctx = GovernanceContext::new(store)
            .with_audit(audit.clone())
            .with_events(events.clone());
        Self {
            ctx,
            audit,
            events,
            meeting,
            motions: motion_ids,
        }
    }

    pub async fn snapshot(&self) -> MeetingSnapshot {
        self.ctx.store.snapshot(TENANT, self.meeting).await.unwrap()
    }

    /// Force the meeting into `status` without guards
    pub async fn force_status(&self, status: gavel_domain::MeetingStatus) {
        let mut tx = self.ctx.store.begin(TENANT, self.meeting).await.unwrap();
        tx.working_mut().meeting.status = status;
        tx.commit().await.unwrap();
    }

    pub async fn attend(&self, member: u64, mode: gavel_domain::AttendanceMode) {
        self.ctx
            .store
            .upsert_attendance(
                TENANT,
                Attendance::new(self.meeting, MemberId::new(member), mode),
            )
            .await
            .unwrap();
    }
}
