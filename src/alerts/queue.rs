use crate::models::{Domain, SeverityLevel};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// An alert waiting for the active one to clear
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAlert {
    pub domain: Domain,
    pub label: String,
    pub severity: SeverityLevel,
    pub timestamp: String,
    pub placeholder: bool,
    pub received_at: DateTime<Utc>,
}

/// Bounded queue ordered by severity, then recency.
///
/// Keys are `(severity, sequence)` so the last entry is the most severe and
/// most recent one, and the first entry is the eviction candidate.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    entries: BTreeMap<(SeverityLevel, u64), PendingAlert>,
    capacity: usize,
    next_seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Queued,
    /// Same domain and label was already waiting; its recency was bumped
    Refreshed,
    /// Queue full, the given entry was evicted to make room
    Evicted(PendingAlert),
    /// Queue full and the new entry ranked lowest, or capacity is 0
    Rejected,
}

impl PendingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, domain: Domain, label: &str) -> Option<(SeverityLevel, u64)> {
        self.entries
            .iter()
            .find(|(_, p)| p.domain == domain && p.label == label)
            .map(|(key, _)| *key)
    }

    pub fn push(&mut self, alert: PendingAlert) -> PushOutcome {
        if self.capacity == 0 {
            return PushOutcome::Rejected;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(key) = self.find(alert.domain, &alert.label) {
            self.entries.remove(&key);
            self.entries.insert((alert.severity, seq), alert);
            return PushOutcome::Refreshed;
        }

        if self.entries.len() < self.capacity {
            self.entries.insert((alert.severity, seq), alert);
            return PushOutcome::Queued;
        }

        let lowest = match self.entries.keys().next() {
            Some(key) => *key,
            None => return PushOutcome::Rejected,
        };
        // The newcomer is more recent than anything queued, so it only loses on severity
        if alert.severity < lowest.0 {
            return PushOutcome::Rejected;
        }

        let evicted = self.entries.remove(&lowest);
        self.entries.insert((alert.severity, seq), alert);
        match evicted {
            Some(evicted) => PushOutcome::Evicted(evicted),
            None => PushOutcome::Queued,
        }
    }

    /// Remove the most severe, most recent entry
    pub fn pop_next(&mut self) -> Option<PendingAlert> {
        self.entries.pop_last().map(|(_, alert)| alert)
    }

    pub fn peek_next(&self) -> Option<&PendingAlert> {
        self.entries.values().next_back()
    }

    pub fn contains(&self, domain: Domain, label: &str) -> bool {
        self.find(domain, label).is_some()
    }

    /// Entries from most to least urgent
    pub fn iter(&self) -> impl Iterator<Item = &PendingAlert> {
        self.entries.values().rev()
    }
}
