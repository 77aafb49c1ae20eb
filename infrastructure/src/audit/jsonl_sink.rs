//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] is serialized as a single JSON line with its
//! `action`, `resource_type`, `resource_id`, actor and `timestamp`, appended
//! to the file via a buffered writer.

use gavel_application::ports::audit_sink::{AuditError, AuditEvent, AuditSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit sink that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlAuditSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Open (or create) the audit file at the given path.
    ///
    /// Creates parent directories if they don't exist. Existing content is
    /// kept; new events are appended. Returns `None` if the file cannot be
    /// opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the audit file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut record = serde_json::to_value(event)?;
        if let serde_json::Value::Object(map) = &mut record
            && let Some(at) = map.remove("at")
        {
            map.insert("timestamp".to_string(), at);
        }
        let line = serde_json::to_string(&record)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AuditError::Unavailable("audit writer lock poisoned".to_string()))?;
        writeln!(writer, "{}", line)?;
        // Audit is append-only; flush every event so a crash loses nothing
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlAuditSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_domain::{ActorContext, Role, TenantId, UserId};
    use std::io::Read;

    fn actor() -> ActorContext {
        ActorContext::new(UserId::new(7), Role::Operator, TenantId::new(3))
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("gavel.jsonl");
        let sink = JsonlAuditSink::new(&path).unwrap();

        sink.record(&AuditEvent::new(
            &actor(),
            "motion_opened",
            "motion",
            12,
            serde_json::json!({ "meeting": 4 }),
        ))
        .unwrap();
        sink.record(&AuditEvent::new(
            &actor(),
            "proxy_revoked",
            "proxy",
            5,
            serde_json::json!(null),
        ))
        .unwrap();
        drop(sink);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["action"], "motion_opened");
        assert_eq!(lines[0]["resource_type"], "motion");
        assert_eq!(lines[0]["resource_id"], 12);
        assert_eq!(lines[0]["payload"]["meeting"], 4);
        assert_eq!(lines[0]["actor"], 7);
        assert_eq!(lines[0]["tenant_id"], 3);
        assert!(lines[0].get("timestamp").is_some());
        assert!(lines[0].get("at").is_none());
        assert_eq!(lines[1]["action"], "proxy_revoked");
    }

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gavel.jsonl");
        for action in ["meeting_created", "meeting_status_changed"] {
            let sink = JsonlAuditSink::new(&path).unwrap();
            sink.record(&AuditEvent::new(
                &actor(),
                action,
                "meeting",
                1,
                serde_json::json!({}),
            ))
            .unwrap();
        }
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["action"], "meeting_status_changed");
    }

    #[test]
    fn test_directory_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlAuditSink::new(dir.path()).is_none());
    }
}
