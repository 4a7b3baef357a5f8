//! Dedup Tracker
//!
//! Tracks which (patent number, due date) pairs have already been surfaced
//! so repeat alerts are not raised for the same fact. Keys are never removed
//! automatically; clearing the snapshot file is the only reset.

use std::collections::HashSet;

use patentwatch_models::{ClassifiedRecord, ReminderKey};

#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    notified: HashSet<ReminderKey>,
}

impl DedupTracker {
    pub fn new(notified: HashSet<ReminderKey>) -> Self {
        Self { notified }
    }

    /// Due records whose key has not been surfaced before.
    ///
    /// Read-only: committing is a separate step so the caller decides
    /// whether to commit before or after its side effect.
    pub fn diff_new(&self, classified: &[ClassifiedRecord]) -> Vec<ClassifiedRecord> {
        classified
            .iter()
            .filter(|c| c.status.is_due() && !self.notified.contains(&c.reminder_key()))
            .cloned()
            .collect()
    }

    /// Record the given records as surfaced. Idempotent.
    pub fn mark_notified(&mut self, records: &[ClassifiedRecord]) {
        for record in records {
            self.notified.insert(record.reminder_key());
        }
    }

    pub fn notified_keys(&self) -> &HashSet<ReminderKey> {
        &self.notified
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }
}
