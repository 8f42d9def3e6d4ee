//! In-memory execution history.
//!
//! A bounded ring of the most recent tool invocations, read newest first.
//! Nothing here is persisted; a restart starts from an empty history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::envelope::ExecutionEnvelope;
use crate::domains::registry::ExecutionType;

/// One past invocation, as returned by `GET /mcp/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: u64,
    pub server: String,
    pub tool: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<ExecutionType>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Filter applied when reading the history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub server: Option<String>,
    pub tool: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct ExecutionHistory {
    capacity: usize,
    next_id: AtomicU64,
    records: Mutex<VecDeque<ExecutionRecord>>,
}

impl ExecutionHistory {
    /// A capacity of zero disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, envelope: &ExecutionEnvelope) -> Option<u64> {
        if self.capacity == 0 {
            return None;
        }

        let metadata = envelope.metadata();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = ExecutionRecord {
            id,
            server: metadata.server.clone(),
            tool: metadata.tool.clone(),
            success: envelope.is_success(),
            error_code: envelope.error_code().map(str::to_string),
            execution_type: metadata.execution_type,
            execution_time_ms: metadata.execution_time_ms,
            timestamp: metadata.timestamp,
        };

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Some(id)
    }

    /// Matching records, newest first.
    pub fn list(&self, query: &HistoryQuery) -> Vec<ExecutionRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let limit = query.limit.unwrap_or(usize::MAX);
        records
            .iter()
            .rev()
            .filter(|r| query.server.as_deref().is_none_or(|s| r.server == s))
            .filter(|r| query.tool.as_deref().is_none_or(|t| r.tool == t))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
