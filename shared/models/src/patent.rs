use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A patent record as supplied by the upload collaborator.
///
/// Records are immutable once loaded; the working set is replaced wholesale
/// on every upload. Patent numbers are not assumed unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub number: String,
    pub name: String,
    pub due_date: NaiveDate,
    pub fee_amount: Decimal,
}

impl PatentRecord {
    /// Identity used to deduplicate reminders for this record.
    ///
    /// Keyed on (number, due date) rather than number alone: a changed due
    /// date is a new fact and must trigger a fresh reminder.
    pub fn reminder_key(&self) -> ReminderKey {
        ReminderKey {
            number: self.number.clone(),
            due_date: self.due_date,
        }
    }
}

/// Urgency status derived from days remaining and the lead-time threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatentStatus {
    /// Due date is further out than the lead time
    Normal,
    /// Within the lead-time window, not yet past due
    Upcoming,
    /// Past the due date
    Expired,
}

impl PatentStatus {
    /// Whether this status warrants a reminder.
    pub fn is_due(&self) -> bool {
        matches!(self, PatentStatus::Upcoming | PatentStatus::Expired)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "upcoming" => Some(Self::Upcoming),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Upcoming => write!(f, "upcoming"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A patent record annotated with its derived urgency.
///
/// Derived fresh on every evaluation from a caller-supplied "today";
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: PatentRecord,
    pub days_remaining: i64,
    pub status: PatentStatus,
}

impl ClassifiedRecord {
    pub fn reminder_key(&self) -> ReminderKey {
        self.record.reminder_key()
    }
}

/// Deduplication identity for reminders: (patent number, due date).
///
/// Once notified, a key is never removed automatically; this gives
/// at-most-once local alerting per distinct (number, date) pair for the
/// lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderKey {
    pub number: String,
    pub due_date: NaiveDate,
}

impl std::fmt::Display for ReminderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.number, self.due_date.format("%Y%m%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str, due: NaiveDate) -> PatentRecord {
        PatentRecord {
            number: number.to_string(),
            name: "Test Patent".to_string(),
            due_date: due,
            fee_amount: Decimal::new(1300, 0),
        }
    }

    #[test]
    fn test_status_parsing_round_trip() {
        for status in [PatentStatus::Normal, PatentStatus::Upcoming, PatentStatus::Expired] {
            assert_eq!(PatentStatus::from_str(&status.to_string()), Some(status));
        }
        assert_eq!(PatentStatus::from_str("unknown"), None);
    }

    #[test]
    fn test_due_statuses() {
        assert!(!PatentStatus::Normal.is_due());
        assert!(PatentStatus::Upcoming.is_due());
        assert!(PatentStatus::Expired.is_due());
    }

    #[test]
    fn test_reminder_key_changes_with_due_date() {
        let due_a = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let due_b = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let key_a = record("ZL202010000000", due_a).reminder_key();
        let key_b = record("ZL202010000000", due_b).reminder_key();
        assert_ne!(key_a, key_b);
        assert_eq!(key_a, record("ZL202010000000", due_a).reminder_key());
    }
}
