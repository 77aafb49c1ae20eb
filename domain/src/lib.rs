//! Domain layer for gavel
//!
//! This crate contains the vote resolution and governance-state rules:
//! entities, value objects, and the pure engines that decide quorum,
//! majority and official results. It has no I/O and no async code.
//!
//! # Engines
//!
//! ```text
//! members + attendance + proxies
//!            │
//!            ▼
//!      ProxyResolver ──► Roster
//!            │              │
//!            ▼              ▼
//!       QuorumEngine   MajorityEngine ◄── tallies (ballots | manual count)
//!            │              │
//!            └──────┬───────┘
//!                   ▼
//!      OfficialResultsConsolidator ──► Motion.official
//! ```
//!
//! # Lifecycle
//!
//! `draft → scheduled → frozen → live → closed → validated → archived`,
//! guarded by [`meeting::lifecycle`]. Once a meeting is validated its
//! records are frozen ([`GovernanceError::MeetingValidatedLocked`]).

pub mod config;
pub mod core;
pub mod majority;
pub mod meeting;
pub mod motion;
pub mod policy;
pub mod quorum;
pub mod results;
pub mod roster;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    actor::{AccessDenied, ActorContext, Capability, Role},
    error::{ErrorCategory, GovernanceError},
    ids::{MeetingId, MemberId, MotionId, PolicyId, TenantId, UserId},
};
pub use majority::{BaseWeights, MajorityEngine, MajorityOutcome, Tallies};
pub use meeting::{
    Convocation, Meeting, MeetingStatus, PolicyAvailability, TransitionContext, guard_open_motion,
    guard_transition,
};
pub use motion::{
    Ballot, BallotChoice, BallotSource, Decision, DecisionReason, ManualTally, Motion,
    MotionStatus, OfficialResult, ResultSource,
};
pub use policy::{DenominatorKind, MajorityBase, QuorumPolicy, ThresholdKind, TieRule, VotePolicy};
pub use quorum::{QuorumEngine, QuorumEvaluation};
pub use results::{Consolidation, ConsolidationContext, OfficialResultsConsolidator};
pub use roster::{
    Attendance, AttendanceMode, EligibilityPath, Member, Proxy, ProxyResolver, ProxyScope,
    ResolvedMember, Roster, RosterInput, RosterOptions,
};
