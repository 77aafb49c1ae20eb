//! Shared plumbing for use cases.
//!
//! [`GovernanceContext`] bundles the store, the best-effort side-effect
//! ports and the engine configuration. [`CommandError`] is the single error
//! type every use case returns.

use crate::config::EngineConfig;
use crate::ports::audit_sink::{AuditEvent, AuditSink, NoAuditSink};
use crate::ports::event_broadcaster::{EventBroadcaster, GovernanceEvent, NoEventBroadcaster};
use crate::ports::governance_store::{GovernanceStore, MeetingSnapshot, StoreError};
use chrono::{DateTime, Utc};
use gavel_domain::{
    AccessDenied, Attendance, Ballot, Consolidation, ConsolidationContext, ErrorCategory,
    GovernanceError, Meeting, Member, MemberId, Motion, MotionId, OfficialResultsConsolidator,
    PolicyId, Proxy, ProxyResolver, QuorumPolicy, Roster, RosterInput, TenantId, VotePolicy,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors returned by every use case
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rule(rule) => CommandError::Governance(rule),
            other => CommandError::Store(other),
        }
    }
}

impl CommandError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Governance(e) => e.kind(),
            CommandError::AccessDenied(_) => "access_denied",
            CommandError::Store(StoreError::LockTimeout(_)) => "lock_timeout",
            CommandError::Store(_) => "storage_failure",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CommandError::Governance(e) => e.category(),
            CommandError::AccessDenied(_) => ErrorCategory::Validation,
            CommandError::Store(_) => ErrorCategory::Infrastructure,
        }
    }

    pub fn justification(&self) -> String {
        format!("[{}] {}", self.kind(), self)
    }

    pub fn governance(&self) -> Option<&GovernanceError> {
        match self {
            CommandError::Governance(e) => Some(e),
            _ => None,
        }
    }
}

/// Effective policies of one motion
#[derive(Debug, Clone, Default)]
pub struct MotionPolicies {
    pub quorum: Option<QuorumPolicy>,
    pub vote: Option<VotePolicy>,
}

impl MotionPolicies {
    pub(crate) fn context<'a>(
        &'a self,
        meeting: &'a Meeting,
        ballots: &'a [Ballot],
        roster: &'a Roster,
    ) -> ConsolidationContext<'a> {
        ConsolidationContext {
            meeting,
            ballots,
            roster,
            quorum_policy: self.quorum.as_ref(),
            vote_policy: self.vote.as_ref(),
        }
    }
}

/// How a consolidation inside a transaction treats an existing result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsolidationMode {
    /// Keep a stored result untouched
    Freeze,
    /// Overwrite the stored result
    Regenerate,
}

/// Consolidate one motion of a locked working copy
pub(crate) fn consolidate_in(
    working: &mut MeetingSnapshot,
    motion: MotionId,
    roster: &Roster,
    policies: &MotionPolicies,
    mode: ConsolidationMode,
    at: DateTime<Utc>,
) -> Result<Consolidation, CommandError> {
    let MeetingSnapshot {
        meeting,
        motions,
        ballots,
        ..
    } = working;
    let target = motions
        .iter_mut()
        .find(|m| m.id == motion)
        .ok_or(GovernanceError::UnknownMotion(motion))?;
    let ctx = policies.context(meeting, ballots, roster);
    let consolidation = match mode {
        ConsolidationMode::Freeze => OfficialResultsConsolidator::consolidate(target, ctx, at)?,
        ConsolidationMode::Regenerate => {
            OfficialResultsConsolidator::regenerate(target, ctx, at)?
        }
    };
    Ok(consolidation)
}

/// Dependencies shared by every use case
pub struct GovernanceContext<S: GovernanceStore + 'static> {
    pub store: Arc<S>,
    pub audit: Arc<dyn AuditSink>,
    pub events: Arc<dyn EventBroadcaster>,
    pub config: EngineConfig,
}

impl<S: GovernanceStore + 'static> Clone for GovernanceContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: Arc::clone(&self.audit),
            events: Arc::clone(&self.events),
            config: self.config,
        }
    }
}

impl<S: GovernanceStore + 'static> GovernanceContext<S> {
    /// Context with no audit trail and no broadcaster
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            audit: Arc::new(NoAuditSink),
            events: Arc::new(NoEventBroadcaster),
            config: EngineConfig::default(),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventBroadcaster>) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolver(&self) -> ProxyResolver {
        ProxyResolver::new(self.config.roster_options())
    }

    /// Resolve a roster against the tenant's current member roll
    pub(crate) async fn roster(
        &self,
        tenant: TenantId,
        attendance: &[Attendance],
        proxies: &[Proxy],
    ) -> Result<Roster, CommandError> {
        let members = self.store.members(tenant).await?;
        self.resolve(&members, attendance, proxies)
    }

    pub(crate) fn resolve(
        &self,
        members: &[Member],
        attendance: &[Attendance],
        proxies: &[Proxy],
    ) -> Result<Roster, CommandError> {
        let roster = self.resolver().resolve(RosterInput {
            members,
            attendance,
            proxies,
        })?;
        if roster.used_fallback() {
            warn!(
                "Attendance fallback in use: no attendance recorded, all {} active members presumed present",
                roster.len()
            );
        }
        Ok(roster)
    }

    /// Load the effective policies of `motion`, motion overrides first
    ///
    /// A reference to a missing policy row resolves to `None`.
    pub(crate) async fn policies(
        &self,
        meeting: &Meeting,
        motion: &Motion,
    ) -> Result<MotionPolicies, CommandError> {
        let tenant = meeting.tenant_id;
        let quorum = match motion.effective_quorum_policy(meeting) {
            Some(id) => {
                let policy = self.store.quorum_policy(tenant, id).await?;
                if policy.is_none() {
                    warn!("{} references missing quorum {}", motion.id, id);
                }
                policy
            }
            None => None,
        };
        let vote = match motion.effective_vote_policy(meeting) {
            Some(id) => {
                let policy = self.store.vote_policy(tenant, id).await?;
                if policy.is_none() {
                    warn!("{} references missing vote {}", motion.id, id);
                }
                policy
            }
            None => None,
        };
        Ok(MotionPolicies { quorum, vote })
    }

    /// Meeting-level quorum policy
    pub(crate) async fn meeting_quorum_policy(
        &self,
        meeting: &Meeting,
    ) -> Result<Option<QuorumPolicy>, CommandError> {
        match meeting.quorum_policy {
            Some(id) => Ok(self.store.quorum_policy(meeting.tenant_id, id).await?),
            None => Ok(None),
        }
    }

    /// Fail unless every referenced policy exists for the tenant
    pub(crate) async fn ensure_policies_exist(
        &self,
        tenant: TenantId,
        quorum: Option<PolicyId>,
        vote: Option<PolicyId>,
    ) -> Result<(), CommandError> {
        if let Some(id) = quorum
            && self.store.quorum_policy(tenant, id).await?.is_none()
        {
            return Err(GovernanceError::UnknownPolicy(id).into());
        }
        if let Some(id) = vote
            && self.store.vote_policy(tenant, id).await?.is_none()
        {
            return Err(GovernanceError::UnknownPolicy(id).into());
        }
        Ok(())
    }

    /// Active member of the tenant, or `UnknownMember`
    pub(crate) async fn active_member(
        &self,
        tenant: TenantId,
        id: MemberId,
    ) -> Result<Member, CommandError> {
        self.store
            .members(tenant)
            .await?
            .into_iter()
            .find(|m| m.id == id && m.active)
            .ok_or_else(|| GovernanceError::UnknownMember(id).into())
    }

    /// Record an audit event; failures are logged, never returned
    pub(crate) fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event) {
            warn!(
                "Audit write failed for {} on {}#{}: {}",
                event.action, event.resource_type, event.resource_id, e
            );
        }
    }

    /// Publish an event; failures are logged, never returned
    pub(crate) fn publish(&self, event: GovernanceEvent) {
        let name = event.name();
        if let Err(e) = self.events.publish(event) {
            warn!("Broadcast of {} failed: {}", name, e);
        }
    }
}
