//! In-memory governance store
//!
//! Rows live in one table set behind an async `RwLock`. Each meeting has its
//! own row lock, a `tokio::sync::Mutex` handed out as an owned guard so a
//! [`MeetingTransaction`] can carry it across awaits.
//!
//! ```text
//! begin(M) ──► row_lock(M).lock_owned() ──► read working copy
//!                   │                                 │
//!                   │          use case edits meeting + motions
//!                   ▼                                 ▼
//!             guard dropped ◄── commit: write rows under tables.write()
//! ```
//!
//! The tables lock is only ever held for a single synchronous read or
//! write, never while waiting on a row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gavel_application::ports::governance_store::{
    GovernanceStore, MeetingSnapshot, MeetingTransaction, StoreError,
};
use gavel_domain::{
    Attendance, Ballot, BallotSource, GovernanceError, Meeting, MeetingId, Member, MemberId,
    Motion, MotionId, PolicyId, Proxy, ProxyResolver, QuorumPolicy, TenantId, VotePolicy,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    meetings: BTreeMap<MeetingId, Meeting>,
    motions: BTreeMap<MotionId, Motion>,
    ballots: BTreeMap<(MotionId, MemberId), Ballot>,
    attendance: BTreeMap<(MeetingId, MemberId), Attendance>,
    proxies: Vec<Proxy>,
    members: BTreeMap<(TenantId, MemberId), Member>,
    quorum_policies: BTreeMap<(TenantId, PolicyId), QuorumPolicy>,
    vote_policies: BTreeMap<(TenantId, PolicyId), VotePolicy>,
}

impl Tables {
    fn meeting(&self, tenant: TenantId, id: MeetingId) -> Result<&Meeting, GovernanceError> {
        self.meetings
            .get(&id)
            .filter(|m| m.tenant_id == tenant)
            .ok_or(GovernanceError::UnknownMeeting(id))
    }

    /// Meeting row that still accepts writes to its child rows
    fn writable(&self, tenant: TenantId, id: MeetingId) -> Result<&Meeting, GovernanceError> {
        let meeting = self.meeting(tenant, id)?;
        meeting.ensure_mutable()?;
        Ok(meeting)
    }

    fn motion_of(&self, meeting: MeetingId, id: MotionId) -> Result<&Motion, GovernanceError> {
        self.motions
            .get(&id)
            .filter(|m| m.meeting_id == meeting)
            .ok_or(GovernanceError::UnknownMotion(id))
    }

    fn member_of(&self, tenant: TenantId, id: MemberId) -> Result<&Member, GovernanceError> {
        self.members
            .get(&(tenant, id))
            .ok_or(GovernanceError::UnknownMember(id))
    }

    fn snapshot(&self, tenant: TenantId, id: MeetingId) -> Result<MeetingSnapshot, GovernanceError> {
        let meeting = self.meeting(tenant, id)?.clone();
        let motions: Vec<Motion> = self
            .motions
            .values()
            .filter(|m| m.meeting_id == id)
            .cloned()
            .collect();
        let ballots = self
            .ballots
            .values()
            .filter(|b| motions.iter().any(|m| m.id == b.motion_id))
            .cloned()
            .collect();
        Ok(MeetingSnapshot {
            meeting,
            motions,
            ballots,
            attendance: self
                .attendance
                .range((id, MemberId::new(0))..=(id, MemberId::new(u64::MAX)))
                .map(|(_, a)| a.clone())
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

/// Fields of a validated meeting that may still change (archiving)
fn frozen_fields_changed(stored: &Meeting, working: &Meeting) -> bool {
    let mut comparable = working.clone();
    comparable.status = stored.status;
    comparable.archived_at = stored.archived_at;
    comparable != *stored
}

/// Transactional in-memory store
///
/// Suitable for a single process: tests, scenario replay and demos.
pub struct InMemoryGovernanceStore {
    tables: Arc<RwLock<Tables>>,
    row_locks: Mutex<HashMap<MeetingId, Arc<Mutex<()>>>>,
    next_id: AtomicU64,
    lock_timeout: Option<Duration>,
}

impl Default for InMemoryGovernanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGovernanceStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            row_locks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            lock_timeout: None,
        }
    }

    /// Fail `begin` with [`StoreError::LockTimeout`] after waiting this long
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn row_lock(&self, meeting: MeetingId) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        Arc::clone(locks.entry(meeting).or_default())
    }
}

struct InMemoryTransaction {
    _guard: OwnedMutexGuard<()>,
    tables: Arc<RwLock<Tables>>,
    tenant: TenantId,
    working: MeetingSnapshot,
}

#[async_trait]
impl MeetingTransaction for InMemoryTransaction {
    fn working(&self) -> &MeetingSnapshot {
        &self.working
    }

    fn working_mut(&mut self) -> &mut MeetingSnapshot {
        &mut self.working
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let id = this.working.meeting.id;
        let mut tables = this.tables.write().await;

        let stored = tables.meeting(this.tenant, id)?;
        if stored.is_validated() {
            let motions_changed = this
                .working
                .motions
                .iter()
                .any(|m| tables.motions.get(&m.id) != Some(m));
            if motions_changed || frozen_fields_changed(stored, &this.working.meeting) {
                return Err(GovernanceError::MeetingValidatedLocked { meeting: id }.into());
            }
        }

        for motion in this.working.motions {
            if let Some(row) = tables.motions.get_mut(&motion.id) {
                *row = motion;
            }
        }
        tables.meetings.insert(id, this.working.meeting);
        debug!("Committed {}", id);
        Ok(())
    }
}

#[async_trait]
impl GovernanceStore for InMemoryGovernanceStore {
    async fn begin(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<Box<dyn MeetingTransaction>, StoreError> {
        self.tables.read().await.meeting(tenant, meeting)?;

        let lock = self.row_lock(meeting).await;
        let guard = match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, lock.lock_owned())
                .await
                .map_err(|_| StoreError::LockTimeout(meeting))?,
            None => lock.lock_owned().await,
        };
        let working = self.tables.read().await.snapshot(tenant, meeting)?;
        debug!("Locked {}", meeting);

        Ok(Box::new(InMemoryTransaction {
            _guard: guard,
            tables: Arc::clone(&self.tables),
            tenant,
            working,
        }))
    }

    async fn snapshot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<MeetingSnapshot, StoreError> {
        Ok(self.tables.read().await.snapshot(tenant, meeting)?)
    }

    async fn members(&self, tenant: TenantId) -> Result<Vec<Member>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .range((tenant, MemberId::new(0))..=(tenant, MemberId::new(u64::MAX)))
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn quorum_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<QuorumPolicy>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .quorum_policies
            .get(&(tenant, id))
            .cloned())
    }

    async fn vote_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<VotePolicy>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .vote_policies
            .get(&(tenant, id))
            .cloned())
    }

    async fn insert_meeting(&self, mut meeting: Meeting) -> Result<MeetingId, StoreError> {
        meeting.id = MeetingId::new(self.next_id());
        let id = meeting.id;
        self.tables.write().await.meetings.insert(id, meeting);
        Ok(id)
    }

    async fn insert_motion(
        &self,
        tenant: TenantId,
        mut motion: Motion,
    ) -> Result<MotionId, StoreError> {
        let mut tables = self.tables.write().await;
        tables.writable(tenant, motion.meeting_id)?;
        motion.id = MotionId::new(self.next_id());
        let id = motion.id;
        tables.motions.insert(id, motion);
        Ok(id)
    }

    async fn upsert_attendance(
        &self,
        tenant: TenantId,
        attendance: Attendance,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.writable(tenant, attendance.meeting_id)?;
        tables.member_of(tenant, attendance.member_id)?;
        tables
            .attendance
            .insert((attendance.meeting_id, attendance.member_id), attendance);
        Ok(())
    }

    async fn upsert_proxy(
        &self,
        tenant: TenantId,
        proxy: Proxy,
        rules: ProxyResolver,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.writable(tenant, proxy.meeting_id)?;
        tables.member_of(tenant, proxy.giver)?;
        tables.member_of(tenant, proxy.receiver)?;
        let current: Vec<Proxy> = tables
            .proxies
            .iter()
            .filter(|p| p.meeting_id == proxy.meeting_id)
            .cloned()
            .collect();
        rules.validate_assignment(&proxy, &current)?;

        let at = proxy.granted_at;
        for existing in tables
            .proxies
            .iter_mut()
            .filter(|p| p.meeting_id == proxy.meeting_id && p.giver == proxy.giver && p.is_active())
        {
            existing.revoke(at);
        }
        tables.proxies.push(proxy);
        Ok(())
    }

    async fn revoke_proxy(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        giver: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Proxy>, StoreError> {
        let mut tables = self.tables.write().await;
        tables.writable(tenant, meeting)?;
        Ok(tables
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
        let mut tables = self.tables.write().await;
        tables.writable(tenant, meeting)?;
        let motion = tables.motion_of(meeting, ballot.motion_id)?;
        // Electronic ballots only land while the motion is open
        if ballot.source == BallotSource::Electronic && !motion.is_open() {
            return Err(GovernanceError::MotionNotOpen(motion.id).into());
        }

        let key = (ballot.motion_id, ballot.member_id);
        if tables.ballots.contains_key(&key) {
            return Err(GovernanceError::DuplicateBallot {
                motion: ballot.motion_id,
                member: ballot.member_id,
            }
            .into());
        }
        tables.ballots.insert(key, ballot);
        Ok(())
    }

    async fn delete_ballot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        motion: MotionId,
        member: MemberId,
    ) -> Result<Ballot, StoreError> {
        let mut tables = self.tables.write().await;
        tables.writable(tenant, meeting)?;
        tables.motion_of(meeting, motion)?;
        tables
            .ballots
            .remove(&(motion, member))
            .ok_or(GovernanceError::BallotNotFound { motion, member }.into())
    }

    async fn insert_member(&self, member: Member) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .members
            .insert((member.tenant_id, member.id), member);
        Ok(())
    }

    async fn insert_quorum_policy(&self, policy: QuorumPolicy) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .quorum_policies
            .insert((policy.tenant_id, policy.id), policy);
        Ok(())
    }

    async fn insert_vote_policy(&self, policy: VotePolicy) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .vote_policies
            .insert((policy.tenant_id, policy.id), policy);
        Ok(())
    }
}
