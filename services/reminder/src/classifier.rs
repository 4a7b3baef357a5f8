//! Record Classifier
//!
//! Pure status derivation for patent records. `today` is caller-supplied so
//! a cycle classifies every record against the same date, and so the
//! function stays trivially testable.

use chrono::NaiveDate;

use patentwatch_models::{ClassifiedRecord, PatentRecord, PatentStatus};

/// Derive status and days remaining for every record.
///
/// Assumes `lead_time_days` is already clamped to its valid range and that
/// records were validated at ingestion; there are no error conditions here.
pub fn classify(records: &[PatentRecord], today: NaiveDate, lead_time_days: i64) -> Vec<ClassifiedRecord> {
    records
        .iter()
        .map(|record| {
            let days_remaining = (record.due_date - today).num_days();
            let status = status_for(days_remaining, lead_time_days);
            ClassifiedRecord {
                record: record.clone(),
                days_remaining,
                status,
            }
        })
        .collect()
}

fn status_for(days_remaining: i64, lead_time_days: i64) -> PatentStatus {
    if days_remaining < 0 {
        PatentStatus::Expired
    } else if days_remaining <= lead_time_days {
        PatentStatus::Upcoming
    } else {
        PatentStatus::Normal
    }
}
