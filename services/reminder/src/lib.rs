//! PatentWatch Reminder Service
//!
//! The reminder scheduling and deduplication engine: classifies uploaded
//! patent records by urgency, raises in-app alerts for newly-due records,
//! and sends throttled email reminders at most once per window.

pub mod classifier;
pub mod dedup;
pub mod notifier;
pub mod scheduler;
pub mod send_log;
pub mod service;
pub mod store;

pub use service::{CycleReport, EmailOutcome, ReminderService, SchedulerStatus};
