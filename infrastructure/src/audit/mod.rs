//! Audit trail adapters.
//!
//! Provides [`JsonlAuditSink`], a JSONL file writer that implements the
//! [`AuditSink`](gavel_application::AuditSink) port.

mod jsonl_sink;

pub use jsonl_sink::JsonlAuditSink;
