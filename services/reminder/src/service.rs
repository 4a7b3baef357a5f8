//! Reminder Service
//!
//! Orchestrates one evaluation cycle: classify the working set, surface
//! newly-due records as in-app alerts, and run the throttled email path.
//! All mutable state lives in this explicit struct, with the snapshot store
//! as its durable backing; nothing hides in framework globals.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use patentwatch_models::{
    AlertEntry, ClassifiedRecord, PatentRecord, SchedulerState, SendGate, StateSnapshot,
};
use patentwatch_utils::{AppConfig, EmailConfig, ReminderConfig, SendError};

use crate::classifier::classify;
use crate::dedup::DedupTracker;
use crate::notifier::EmailNotifier;
use crate::scheduler::SendScheduler;
use crate::send_log::SendLog;
use crate::store::SnapshotStore;

/// Outcome of the email path for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EmailOutcome {
    /// Email reminders are disabled or the config is incomplete
    Disabled,
    /// No upcoming or expired records this cycle
    NothingDue,
    /// The send window has not opened yet
    Deferred { remaining_seconds: i64 },
    Sent,
    Failed { reason: String },
}

/// Summary of one evaluation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub total: usize,
    pub upcoming: usize,
    pub expired: usize,
    pub new_alerts: usize,
    pub email: EmailOutcome,
}

/// Scheduler timing as reported to operators.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub last_sent_at: Option<DateTime<Utc>>,
    pub next_allowed_at: Option<DateTime<Utc>>,
    pub remaining_seconds: Option<i64>,
}

#[derive(Clone)]
pub struct ReminderService {
    records: Arc<RwLock<Vec<PatentRecord>>>,
    last_upload_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    lead_time_days: Arc<RwLock<i64>>,
    email_config: Arc<RwLock<EmailConfig>>,
    alerts: Arc<RwLock<Vec<AlertEntry>>>,
    tracker: Arc<RwLock<DedupTracker>>,
    // Single critical section for the check-and-arm gate; classification and
    // the actual SMTP exchange run outside it.
    scheduler: Arc<Mutex<SendScheduler>>,
    store: Arc<SnapshotStore>,
    send_log: Arc<SendLog>,
    notifier: Arc<EmailNotifier>,
}

impl ReminderService {
    /// Build the service, restoring tracker/scheduler state from the
    /// snapshot store. An unreadable snapshot is discarded with a warning;
    /// the service starts fresh rather than refusing to run.
    pub fn new(config: &AppConfig) -> Self {
        let store = SnapshotStore::new(&config.reminder.data_file);

        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable state snapshot");
                None
            }
        };

        let (notified_keys, scheduler_state, lead_time_days) = match snapshot {
            Some(snapshot) => (
                snapshot.notified_keys,
                snapshot.scheduler,
                ReminderConfig::clamp_lead_time(snapshot.lead_time_days),
            ),
            None => (Default::default(), SchedulerState::default(), config.reminder.lead_time_days),
        };

        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            last_upload_at: Arc::new(RwLock::new(None)),
            lead_time_days: Arc::new(RwLock::new(lead_time_days)),
            email_config: Arc::new(RwLock::new(config.email.clone())),
            alerts: Arc::new(RwLock::new(Vec::new())),
            tracker: Arc::new(RwLock::new(DedupTracker::new(notified_keys))),
            scheduler: Arc::new(Mutex::new(SendScheduler::new(
                scheduler_state,
                config.reminder.min_send_interval(),
            ))),
            store: Arc::new(store),
            send_log: Arc::new(SendLog::new(&config.reminder.send_log_file)),
            notifier: Arc::new(EmailNotifier::new()),
        }
    }

    /// Replace the working set wholesale. Dedup state is deliberately kept:
    /// a previously surfaced (number, date) pair stays surfaced even if the
    /// same sheet is uploaded again.
    pub async fn replace_records(&self, records: Vec<PatentRecord>, now: DateTime<Utc>) -> usize {
        let count = records.len();
        *self.records.write().await = records;
        *self.last_upload_at.write().await = Some(now);
        info!(count, "Replaced patent working set");
        count
    }

    /// Classify the current working set. Cheap, in-memory; this is the path
    /// the interactive status views use.
    pub async fn classified_records(&self, today: NaiveDate) -> Vec<ClassifiedRecord> {
        let records = self.records.read().await;
        let lead_time = *self.lead_time_days.read().await;
        classify(&records, today, lead_time)
    }

    pub async fn due_records(&self, today: NaiveDate) -> Vec<ClassifiedRecord> {
        self.classified_records(today)
            .await
            .into_iter()
            .filter(|c| c.status.is_due())
            .collect()
    }

    /// Count of records per status, for the distribution view.
    pub async fn status_counts(&self, today: NaiveDate) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for classified in self.classified_records(today).await {
            *counts.entry(classified.status.to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub async fn alerts(&self) -> Vec<AlertEntry> {
        self.alerts.read().await.clone()
    }

    pub async fn last_upload_at(&self) -> Option<DateTime<Utc>> {
        *self.last_upload_at.read().await
    }

    pub async fn lead_time_days(&self) -> i64 {
        *self.lead_time_days.read().await
    }

    /// Update the lead time, clamped to the valid range. Persisted with the
    /// rest of the state so it survives restarts.
    pub async fn set_lead_time_days(&self, days: i64) -> i64 {
        let clamped = ReminderConfig::clamp_lead_time(days);
        *self.lead_time_days.write().await = clamped;
        self.persist_state().await;
        clamped
    }

    pub async fn email_config(&self) -> EmailConfig {
        self.email_config.read().await.clone()
    }

    pub async fn set_email_config(&self, config: EmailConfig) {
        *self.email_config.write().await = config;
        info!("Updated email configuration");
    }

    pub async fn scheduler_status(&self, now: DateTime<Utc>) -> SchedulerStatus {
        let scheduler = self.scheduler.lock().await;
        let state = scheduler.state();
        SchedulerStatus {
            last_sent_at: state.last_sent_at,
            next_allowed_at: state.next_allowed_at,
            remaining_seconds: scheduler.remaining_wait(now).map(|d| d.num_seconds()),
        }
    }

    /// Run one evaluation cycle against the local wall clock.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now(), Local::now().date_naive()).await
    }

    /// Run one evaluation cycle: classify, diff, alert, then the gated
    /// email path. Never fatal; every failure mode is reported in the
    /// returned report and safe to retry on the next tick.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>, today: NaiveDate) -> CycleReport {
        let classified = self.classified_records(today).await;

        let total = classified.len();
        let upcoming = classified.iter().filter(|c| c.status == patentwatch_models::PatentStatus::Upcoming).count();
        let expired = classified.iter().filter(|c| c.status == patentwatch_models::PatentStatus::Expired).count();

        // Local alert path: always attempted, gated only by the dedup
        // tracker. Committed optimistically; alerts are fire-and-forget.
        let fresh = {
            let mut tracker = self.tracker.write().await;
            let fresh = tracker.diff_new(&classified);
            tracker.mark_notified(&fresh);
            fresh
        };

        if !fresh.is_empty() {
            let mut alerts = self.alerts.write().await;
            for record in &fresh {
                let alert = AlertEntry {
                    id: Uuid::new_v4(),
                    key: record.reminder_key(),
                    patent_name: record.record.name.clone(),
                    days_remaining: record.days_remaining,
                    raised_at: now,
                };
                info!(alert = %alert.message(), "Raised fee reminder alert");
                alerts.push(alert);
            }
            drop(alerts);
            self.persist_state().await;
        }

        let due: Vec<ClassifiedRecord> = classified.into_iter().filter(|c| c.status.is_due()).collect();
        let email = self.email_cycle(now, &due).await;

        CycleReport {
            total,
            upcoming,
            expired,
            new_alerts: fresh.len(),
            email,
        }
    }

    /// The throttled email path for one cycle. At most one attempt per
    /// window; the window is armed inside the scheduler lock before the
    /// SMTP exchange happens outside it.
    async fn email_cycle(&self, now: DateTime<Utc>, due: &[ClassifiedRecord]) -> EmailOutcome {
        let email_config = self.email_config.read().await.clone();
        if !email_config.is_complete() {
            return EmailOutcome::Disabled;
        }
        if due.is_empty() {
            return EmailOutcome::NothingDue;
        }

        let gate = {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.should_send(now)
        };
        // The gate may have armed the next window; record that durably
        // before attempting the send.
        self.persist_state().await;

        match gate {
            SendGate::Deferred(remaining) => {
                info!(remaining_seconds = remaining.num_seconds(), "Email send deferred");
                EmailOutcome::Deferred {
                    remaining_seconds: remaining.num_seconds(),
                }
            }
            SendGate::Allowed => match self.notifier.send(&email_config, due).await {
                Ok(()) => {
                    let detail = format!("Reminder sent for {} due patents", due.len());
                    self.log_send_attempt(now, true, &detail);
                    {
                        let mut scheduler = self.scheduler.lock().await;
                        scheduler.commit_sent(now);
                    }
                    self.persist_state().await;
                    info!(due = due.len(), "Reminder email sent");
                    EmailOutcome::Sent
                }
                Err(send_error) => {
                    self.log_send_attempt(now, false, &send_error.to_string());
                    // No immediate retry; the armed window defers to the
                    // next cycle.
                    error!(error = %send_error, "Reminder email failed");
                    EmailOutcome::Failed {
                        reason: send_error_reason(&send_error),
                    }
                }
            },
        }
    }

    fn log_send_attempt(&self, now: DateTime<Utc>, success: bool, detail: &str) {
        if let Err(e) = self.send_log.append(now, success, detail) {
            warn!(error = %e, "Failed to append to send log");
        }
    }

    /// Write the current snapshot. Log-and-continue on failure: in-memory
    /// state stays authoritative for the running process, but repeated
    /// errors must be visible to the operator.
    async fn persist_state(&self) {
        let snapshot = {
            let tracker = self.tracker.read().await;
            let scheduler = self.scheduler.lock().await;
            let lead_time = *self.lead_time_days.read().await;
            StateSnapshot {
                version: patentwatch_models::SNAPSHOT_VERSION,
                notified_keys: tracker.notified_keys().clone(),
                scheduler: scheduler.state().clone(),
                lead_time_days: lead_time,
            }
        };

        if let Err(e) = self.store.save(&snapshot) {
            error!(error = %e, "Failed to persist state snapshot");
        }
    }
}

fn send_error_reason(error: &SendError) -> String {
    match error {
        SendError::Auth => "authentication".to_string(),
        SendError::Connect => "connectivity".to_string(),
        SendError::Other(detail) => detail.clone(),
    }
}
