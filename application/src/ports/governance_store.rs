//! Governance store port
//!
//! Persistence contract for meetings, motions, ballots, attendance, proxies,
//! members and policies.
//!
//! # Locking
//!
//! Meeting and motion rows are the only coordination points. They are
//! written through a [`MeetingTransaction`] obtained from
//! [`GovernanceStore::begin`], which holds the meeting's row lock until it is
//! committed or dropped. Transactions on different meetings never contend.
//!
//! Ballots, attendance and proxies are read as of `begin` and written
//! without the lock. Ballot inserts rely on the store's uniqueness
//! constraint on `(motion, member)`; proxy inserts re-check the delegation
//! rules against the rows present at write time.
//!
//! Every write touching a validated meeting fails with
//! [`GovernanceError::MeetingValidatedLocked`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gavel_domain::{
    Attendance, Ballot, GovernanceError, Meeting, MeetingId, Member, MemberId, Motion, MotionId,
    PolicyId, Proxy, ProxyResolver, QuorumPolicy, TenantId, VotePolicy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A row-level rule rejected the write (uniqueness, validated lock, unknown row)
    #[error(transparent)]
    Rule(#[from] GovernanceError),

    #[error("Timed out waiting for the row lock on {0}")]
    LockTimeout(MeetingId),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Every row of one meeting, read consistently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSnapshot {
    pub meeting: Meeting,
    pub motions: Vec<Motion>,
    pub ballots: Vec<Ballot>,
    pub attendance: Vec<Attendance>,
    pub proxies: Vec<Proxy>,
}

impl MeetingSnapshot {
    pub fn motion(&self, id: MotionId) -> Option<&Motion> {
        self.motions.iter().find(|m| m.id == id)
    }

    pub fn motion_mut(&mut self, id: MotionId) -> Option<&mut Motion> {
        self.motions.iter_mut().find(|m| m.id == id)
    }

    pub fn ballot(&self, motion: MotionId, member: MemberId) -> Option<&Ballot> {
        self.ballots
            .iter()
            .find(|b| b.motion_id == motion && b.member_id == member)
    }
}

/// A locked working copy of one meeting
///
/// `meeting` and `motions` may be modified; [`commit`](Self::commit) writes
/// them back atomically. Dropping the transaction without committing
/// discards every change and releases the lock.
#[async_trait]
pub trait MeetingTransaction: Send {
    fn working(&self) -> &MeetingSnapshot;

    fn working_mut(&mut self) -> &mut MeetingSnapshot;

    /// Publish the meeting and motion rows and release the lock
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Store for governance rows
///
/// All lookups are tenant-scoped: a meeting owned by another tenant is
/// reported as [`GovernanceError::UnknownMeeting`].
#[async_trait]
pub trait GovernanceStore: Send + Sync {
    // ==================== Locked ====================

    /// Acquire the meeting row lock and read a working copy
    async fn begin(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<Box<dyn MeetingTransaction>, StoreError>;

    // ==================== Reads ====================

    async fn snapshot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
    ) -> Result<MeetingSnapshot, StoreError>;

    /// Every member of the tenant, active or not
    async fn members(&self, tenant: TenantId) -> Result<Vec<Member>, StoreError>;

    async fn quorum_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<QuorumPolicy>, StoreError>;

    async fn vote_policy(
        &self,
        tenant: TenantId,
        id: PolicyId,
    ) -> Result<Option<VotePolicy>, StoreError>;

    // ==================== Writes ====================

    /// Insert a meeting; the store assigns its id
    async fn insert_meeting(&self, meeting: Meeting) -> Result<MeetingId, StoreError>;

    /// Insert a motion; the store assigns its id
    async fn insert_motion(&self, tenant: TenantId, motion: Motion)
    -> Result<MotionId, StoreError>;

    /// Insert or replace the attendance row of `(meeting, member)`
    async fn upsert_attendance(
        &self,
        tenant: TenantId,
        attendance: Attendance,
    ) -> Result<(), StoreError>;

    /// Insert a proxy, replacing any active proxy of the same giver
    ///
    /// `rules` is checked against the meeting's active proxies inside the
    /// same write, so concurrent assignments cannot breach the ceiling or
    /// form a chain.
    async fn upsert_proxy(
        &self,
        tenant: TenantId,
        proxy: Proxy,
        rules: ProxyResolver,
    ) -> Result<(), StoreError>;

    /// Revoke the active proxy of `giver`, returning it
    async fn revoke_proxy(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        giver: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Proxy>, StoreError>;

    /// Append a ballot; fails with [`GovernanceError::DuplicateBallot`]
    async fn append_ballot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        ballot: Ballot,
    ) -> Result<(), StoreError>;

    /// Delete and return a ballot
    async fn delete_ballot(
        &self,
        tenant: TenantId,
        meeting: MeetingId,
        motion: MotionId,
        member: MemberId,
    ) -> Result<Ballot, StoreError>;

    // ==================== Reference data ====================

    async fn insert_member(&self, member: Member) -> Result<(), StoreError>;

    async fn insert_quorum_policy(&self, policy: QuorumPolicy) -> Result<(), StoreError>;

    async fn insert_vote_policy(&self, policy: VotePolicy) -> Result<(), StoreError>;
}
