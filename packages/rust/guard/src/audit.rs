//! Bounded audit log of guarded operations.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default ring capacity; the oldest record is dropped beyond it.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Final status of one guarded execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Failed,
}

/// What the operation acted on, for display and name-confirmation.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    /// Destination object id, when known.
    pub target_id: Option<String>,
    /// Human-readable name of the target.
    pub target_name: Option<String>,
}

impl OperationContext {
    pub fn target(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            target_id: Some(id.into()),
            target_name: Some(name.into()),
        }
    }
}

/// One appended record. Immutable once written.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub id: Uuid,
    pub operation: String,
    pub context: OperationContext,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: OperationStatus,
    pub error: Option<String>,
}

impl OperationRecord {
    pub fn new(
        operation: impl Into<String>,
        context: OperationContext,
        started_at: DateTime<Utc>,
        status: OperationStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            operation: operation.into(),
            context,
            started_at,
            ended_at: Utc::now(),
            status,
            error,
        }
    }
}

/// Ring buffer of operation records, appended only while enabled.
#[derive(Debug)]
pub struct AuditLog {
    enabled: bool,
    capacity: usize,
    records: VecDeque<OperationRecord>,
}

impl AuditLog {
    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity,
            records: VecDeque::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Append a record, evicting the oldest beyond capacity.
    /// A disabled log drops the record silently.
    pub fn append(&mut self, record: OperationRecord) {
        if !self.enabled {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The `n` most recent records, newest first.
    pub fn recent(&self, n: usize) -> Vec<&OperationRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Every retained record, oldest first.
    pub fn all(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(operation: &str) -> OperationRecord {
        OperationRecord::new(
            operation,
            OperationContext::default(),
            Utc::now(),
            OperationStatus::Success,
            None,
        )
    }

    #[test]
    fn append_and_read_back() {
        let mut log = AuditLog::new(true);
        log.append(record("create_page"));
        log.append(record("archive_page"));

        assert_eq!(log.len(), 2);
        let recent = log.recent(1);
        assert_eq!(recent[0].operation, "archive_page");

        let all: Vec<&str> = log.all().map(|r| r.operation.as_str()).collect();
        assert_eq!(all, vec!["create_page", "archive_page"]);
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let mut log = AuditLog::with_capacity(true, 3);
        for i in 0..5 {
            log.append(record(&format!("op{i}")));
        }

        assert_eq!(log.len(), 3);
        let all: Vec<&str> = log.all().map(|r| r.operation.as_str()).collect();
        assert_eq!(all, vec!["op2", "op3", "op4"]);
    }

    #[test]
    fn disabled_log_stays_empty() {
        let mut log = AuditLog::new(false);
        log.append(record("create_page"));
        assert!(log.is_empty());
    }

    #[test]
    fn recent_is_bounded_by_len() {
        let mut log = AuditLog::new(true);
        log.append(record("only"));
        assert_eq!(log.recent(10).len(), 1);
    }
}
