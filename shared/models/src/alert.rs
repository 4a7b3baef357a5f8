use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ReminderKey;

/// An in-app alert raised the first time a (patent, due date) pair is seen
/// as due. Fire-and-forget: not retried and independent of email gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEntry {
    pub id: Uuid,
    pub key: ReminderKey,
    pub patent_name: String,
    pub days_remaining: i64,
    pub raised_at: DateTime<Utc>,
}

impl AlertEntry {
    pub fn message(&self) -> String {
        if self.days_remaining < 0 {
            format!(
                "Patent {} ({}) is {} days past its fee due date",
                self.patent_name,
                self.key.number,
                -self.days_remaining
            )
        } else {
            format!(
                "Patent {} ({}) fee is due in {} days",
                self.patent_name, self.key.number, self.days_remaining
            )
        }
    }
}
