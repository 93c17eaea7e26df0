//! Audit Logger - Records relay outcomes
//!
//! One record is written per event: the filter denial of a send, and the
//! outcome of the backend call. Sinks must write each record atomically;
//! no ordering is promised across concurrent sends.

use chrono::{DateTime, Utc};
use mailrelay_common::config::AuditSinkKind;
use serde::Serialize;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Target used for audit events emitted through tracing
pub const AUDIT_TARGET: &str = "mailrelay::audit";

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub time: DateTime<Utc>,
    /// Origin peer IP
    pub ip: String,
    pub from: String,
    /// Denied or attempted recipients, depending on the event
    pub to: Vec<String>,
    pub error: Option<String>,
}

impl AuditRecord {
    /// Create a record stamped with the current time
    pub fn new(
        origin: SocketAddr,
        from: &str,
        to: &[String],
        error: Option<&dyn std::fmt::Display>,
    ) -> Self {
        Self {
            time: Utc::now(),
            ip: origin.ip().to_string(),
            from: from.to_string(),
            to: to.to_vec(),
            error: error.map(|e| e.to_string()),
        }
    }
}

/// Append target for audit records
pub trait AuditSink: Send + Sync {
    /// Write a single record
    fn record(&self, record: &AuditRecord);
}

/// Create the sink selected in the configuration
pub fn sink_for(kind: AuditSinkKind) -> Arc<dyn AuditSink> {
    match kind {
        AuditSinkKind::Stdio => Arc::new(JsonSink::stdio()),
        AuditSinkKind::Tracing => Arc::new(TracingSink),
    }
}

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// JSON lines sink: successful events go to `out`, failures to `err`
pub struct JsonSink {
    out: SharedWriter,
    err: SharedWriter,
}

impl JsonSink {
    /// Create a sink over arbitrary writers
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Write to stdout and stderr
    pub fn stdio() -> Self {
        Self::new(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }
}

impl AuditSink for JsonSink {
    fn record(&self, record: &AuditRecord) {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize audit record: {}", e);
                return;
            }
        };
        line.push(b'\n');

        let target = if record.error.is_some() {
            &self.err
        } else {
            &self.out
        };

        // The lock is held for the whole record so lines never interleave
        let mut writer = target.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.write_all(&line).and_then(|_| writer.flush()) {
            warn!("Failed to write audit record: {}", e);
        }
    }
}

/// Emits audit records as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, record: &AuditRecord) {
        match &record.error {
            None => info!(
                target: AUDIT_TARGET,
                ip = %record.ip,
                from = %record.from,
                to = ?record.to,
                "relayed"
            ),
            Some(error) => warn!(
                target: AUDIT_TARGET,
                ip = %record.ip,
                from = %record.from,
                to = ?record.to,
                error = %error,
                "relay error"
            ),
        }
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AuditSink for MemorySink {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let data = self.0.lock().unwrap().clone();
            String::from_utf8(data)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn origin() -> SocketAddr {
        "127.0.0.1:2525".parse().unwrap()
    }

    #[test]
    fn test_record_fields() {
        let to = vec!["bob@example.org".to_string()];
        let record = AuditRecord::new(origin(), "alice@example.org", &to, None);
        assert_eq!(record.ip, "127.0.0.1");
        assert_eq!(record.from, "alice@example.org");
        assert_eq!(record.to, to);
        assert!(record.error.is_none());

        let err = anyhow::anyhow!("throttled");
        let record = AuditRecord::new(origin(), "alice@example.org", &to, Some(&err));
        assert_eq!(record.error.as_deref(), Some("throttled"));
    }

    #[test]
    fn test_json_sink_splits_by_error() {
        let out = Buffer::default();
        let err = Buffer::default();
        let sink = JsonSink::new(Box::new(out.clone()), Box::new(err.clone()));
        let to = vec!["bob@example.org".to_string()];

        sink.record(&AuditRecord::new(origin(), "alice@example.org", &to, None));
        let denied = crate::error::RelayError::RecipientsDenied;
        sink.record(&AuditRecord::new(
            origin(),
            "alice@example.org",
            &to,
            Some(&denied),
        ));

        let out_lines = out.lines();
        assert_eq!(out_lines.len(), 1);
        assert_eq!(out_lines[0]["ip"], "127.0.0.1");
        assert_eq!(out_lines[0]["from"], "alice@example.org");
        assert_eq!(out_lines[0]["to"][0], "bob@example.org");
        assert!(out_lines[0]["error"].is_null());
        assert!(out_lines[0]["time"].is_string());

        let err_lines = err.lines();
        assert_eq!(err_lines.len(), 1);
        assert_eq!(err_lines[0]["error"], denied.to_string());
    }

    #[test]
    fn test_json_sink_concurrent_records_do_not_interleave() {
        let out = Buffer::default();
        let sink = Arc::new(JsonSink::new(
            Box::new(out.clone()),
            Box::new(Buffer::default()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    let to = vec![format!("user{}@example.org", i)];
                    for _ in 0..50 {
                        sink.record(&AuditRecord::new(origin(), "a@example.org", &to, None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(out.lines().len(), 400);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.record(&AuditRecord::new(origin(), "a@example.org", &[], None));
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_sink_for() {
        // Only checks construction; both sinks are usable as trait objects
        let sink = sink_for(AuditSinkKind::Tracing);
        sink.record(&AuditRecord::new(origin(), "a@example.org", &[], None));
    }
}
