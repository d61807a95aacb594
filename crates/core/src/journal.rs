//! Bounded in-memory journal of recent webhook deliveries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Longest raw body kept for a delivery that is not valid JSON.
const MAX_RAW_BODY_CHARS: usize = 2048;

/// One webhook delivery and how it was answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    pub ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_id: Option<i64>,
    /// HTTP status returned to Telegram.
    pub status: u16,
    /// Short machine-readable result, e.g. `processed` or `invalid_json`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<usize>,
    pub payload: serde_json::Value,
}

impl JournalEntry {
    /// Entry for a delivery, keeping the body as JSON when it parses and as
    /// truncated text otherwise.
    pub fn new(body: &[u8], status: u16, outcome: &str) -> Self {
        let payload = serde_json::from_slice(body).unwrap_or_else(|_| {
            serde_json::Value::String(
                String::from_utf8_lossy(body)
                    .chars()
                    .take(MAX_RAW_BODY_CHARS)
                    .collect(),
            )
        });
        let update_id = payload.get("update_id").and_then(serde_json::Value::as_i64);

        Self {
            ts: Utc::now(),
            update_id,
            status,
            outcome: outcome.to_string(),
            added: None,
            payload,
        }
    }
}

/// Keeps the latest `capacity` entries, oldest evicted first.
pub struct UpdateJournal {
    capacity: usize,
    entries: Mutex<VecDeque<JournalEntry>>,
}

impl UpdateJournal {
    /// A zero capacity records nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<JournalEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, entry: JournalEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The newest `n` entries, oldest first.
    pub fn last(&self, n: usize) -> Vec<JournalEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
