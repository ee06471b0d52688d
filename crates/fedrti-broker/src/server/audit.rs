// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Audit trail.
//!
//! The registry reports every request it handles exactly once, accepted or
//! rejected. Sinks only record; they never influence the outcome.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

/// One handled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub connection: u64,
    pub federation: u32,
    pub federate: u32,
    pub kind: &'static str,
    /// Exception name when the request was rejected.
    pub rejected: Option<&'static str>,
    pub description: String,
}

impl AuditRecord {
    pub fn is_rejection(&self) -> bool {
        self.rejected.is_some()
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Audit records as tracing events.
#[derive(Debug, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, record: &AuditRecord) {
        match record.rejected {
            Some(exception) => warn!(
                "[audit] conn={} federate={} {} rejected: {} ({})",
                record.connection, record.federate, record.kind, exception, record.description
            ),
            None => debug!(
                "[audit] conn={} federate={} {} {}",
                record.connection, record.federate, record.kind, record.description
            ),
        }
    }
}

/// Append-only JSON-lines file.
pub struct FileAudit {
    writer: Mutex<BufWriter<File>>,
}

impl FileAudit {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl AuditSink for FileAudit {
    fn record(&self, record: &AuditRecord) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Audit write failed: {}", e);
        }
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: &AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rejected: Option<&'static str>) -> AuditRecord {
        AuditRecord {
            connection: 1,
            federation: 1,
            federate: 2,
            kind: "PUBLISH_OBJECT_CLASS",
            rejected,
            description: "class 1".into(),
        }
    }

    #[test]
    fn test_file_audit_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = FileAudit::open(&path).unwrap();
        sink.record(&record(None));
        sink.record(&record(Some("SaveInProgress")));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["rejected"], "SaveInProgress");
        assert_eq!(second["kind"], "PUBLISH_OBJECT_CLASS");
    }

    #[test]
    fn test_memory_audit() {
        let sink = MemoryAudit::new();
        sink.record(&record(None));
        assert_eq!(sink.records().len(), 1);
        assert!(!sink.records()[0].is_rejection());
    }
}
