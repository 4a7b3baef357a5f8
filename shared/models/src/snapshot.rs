use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ReminderKey, SchedulerState};

/// Current snapshot schema version. Bump on any incompatible field change.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The durable form of tracker + scheduler state.
///
/// An explicit versioned struct so stale or incompatible snapshots are
/// rejected on load instead of silently deserialized into the wrong shape.
/// Loaded once at startup, written back after every state-changing
/// evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub notified_keys: HashSet<ReminderKey>,
    #[serde(flatten)]
    pub scheduler: SchedulerState,
    pub lead_time_days: i64,
}

impl StateSnapshot {
    pub fn new(lead_time_days: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            notified_keys: HashSet::new(),
            scheduler: SchedulerState::default(),
            lead_time_days,
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == SNAPSHOT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut snapshot = StateSnapshot::new(49);
        snapshot.notified_keys.insert(ReminderKey {
            number: "ZL202010000000".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        });

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: StateSnapshot = serde_json::from_str(&json).unwrap();

        assert!(restored.is_current_version());
        assert_eq!(restored.lead_time_days, 49);
        assert_eq!(restored.notified_keys, snapshot.notified_keys);
        assert_eq!(restored.scheduler, SchedulerState::default());
    }
}
