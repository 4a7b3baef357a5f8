//! # PatentWatch Domain Models
//!
//! Core domain models for the PatentWatch fee reminder system.
//! All models implement serialization/deserialization with serde.
//!
//! ## Key Models
//!
//! - **PatentRecord**: A patent with its fee due date and amount, as uploaded
//! - **ClassifiedRecord**: A record annotated with days remaining and urgency status
//! - **ReminderKey**: The (patent number, due date) identity used to deduplicate reminders
//! - **SchedulerState**: The last-sent / next-allowed timestamps gating email sends
//! - **StateSnapshot**: The versioned persisted form of tracker + scheduler state

pub mod alert;
pub mod patent;
pub mod schedule;
pub mod snapshot;

pub use alert::*;
pub use patent::*;
pub use schedule::*;
pub use snapshot::*;
