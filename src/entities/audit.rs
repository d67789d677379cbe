// 📜 Audit Trail - append-only, most-recent-first
//
// Entries are never mutated or removed once written. The log exposes no
// removal API at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl AuditEntry {
    pub fn new(message: impl Into<String>) -> Self {
        AuditEntry::at(Utc::now(), message)
    }

    pub fn at(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        AuditEntry {
            timestamp,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry at the head of the log
    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push_front(entry);
    }

    /// Entries, most recent first
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }
}
