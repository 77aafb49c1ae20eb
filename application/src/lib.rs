//! Application layer for gavel
//!
//! This crate contains use cases, port definitions, and engine configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EngineConfig;
pub use ports::{
    audit_sink::{AuditError, AuditEvent, AuditSink, NoAuditSink},
    event_broadcaster::{BroadcastError, EventBroadcaster, GovernanceEvent, NoEventBroadcaster},
    governance_store::{GovernanceStore, MeetingSnapshot, MeetingTransaction, StoreError},
};
pub use use_cases::attendance::{AssignProxyUseCase, RecordAttendanceUseCase, RevokeProxyUseCase};
pub use use_cases::lifecycle::{
    LaunchMeetingUseCase, TransitionMeetingUseCase, TransitionOutcome, ValidateMeetingUseCase,
};
pub use use_cases::motions::{CloseMotionUseCase, OpenMotionUseCase};
pub use use_cases::results::{
    AttendanceSummary, EvaluateQuorumUseCase, GetMeetingReportUseCase, GetOfficialResultUseCase,
    MeetingReport, MotionReport, RegenerateResultUseCase, ResultView,
};
pub use use_cases::setup::{
    AddMotionInput, AddMotionUseCase, AssignPresidentUseCase, CreateMeetingInput,
    CreateMeetingUseCase,
};
pub use use_cases::shared::{CommandError, GovernanceContext, MotionPolicies};
pub use use_cases::voting::{
    CastBallotInput, CastBallotUseCase, DeleteManualBallotUseCase, RecordManualTallyInput,
    RecordManualTallyUseCase,
};
