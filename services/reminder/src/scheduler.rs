//! Send Scheduler
//!
//! Gates email sends to at most one attempt per minimum-interval window.
//! The window is armed before the attempt, not after: a crashed or slow
//! send cannot produce two attempts inside the same window.

use chrono::{DateTime, Duration, Utc};

use patentwatch_models::{SchedulerState, SendGate};

#[derive(Debug, Clone)]
pub struct SendScheduler {
    state: SchedulerState,
    min_interval: Duration,
}

impl SendScheduler {
    pub fn new(state: SchedulerState, min_interval: Duration) -> Self {
        Self { state, min_interval }
    }

    /// Check the gate and, when the window is open, arm the next one.
    ///
    /// Callers must hold the cycle's critical section around this call; the
    /// read-and-advance of `next_allowed_at` is what keeps two concurrent
    /// cycles from both observing an open window.
    pub fn should_send(&mut self, now: DateTime<Utc>) -> SendGate {
        match self.state.next_allowed_at {
            Some(next_allowed) if now < next_allowed => {
                return SendGate::Deferred(next_allowed - now);
            }
            _ => {
                self.state.next_allowed_at = Some(now + self.min_interval);
            }
        }

        if let Some(last_sent) = self.state.last_sent_at {
            let since_last = now - last_sent;
            if since_last < self.min_interval {
                return SendGate::Deferred(self.min_interval - since_last);
            }
        }

        SendGate::Allowed
    }

    /// Record a successful send. A failed send leaves `last_sent_at`
    /// untouched; the already-armed window defers the retry.
    pub fn commit_sent(&mut self, now: DateTime<Utc>) {
        self.state.last_sent_at = Some(now);
        self.state.next_allowed_at = Some(now + self.min_interval);
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Remaining wait before the next window opens, if any.
    pub fn remaining_wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.state
            .next_allowed_at
            .filter(|next_allowed| now < *next_allowed)
            .map(|next_allowed| next_allowed - now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    fn scheduler() -> SendScheduler {
        SendScheduler::new(SchedulerState::default(), minutes(3))
    }

    fn now() -> DateTime<Utc> {
        "2026-08-24T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_first_check_is_allowed_and_arms_window() {
        let mut scheduler = scheduler();

        assert_eq!(scheduler.should_send(now()), SendGate::Allowed);
        assert_eq!(scheduler.state().next_allowed_at, Some(now() + minutes(3)));
        // Allowed alone does not record a send
        assert_eq!(scheduler.state().last_sent_at, None);
    }

    #[test]
    fn test_at_most_once_per_window() {
        let mut scheduler = scheduler();

        assert_eq!(scheduler.should_send(now()), SendGate::Allowed);
        let retry = scheduler.should_send(now() + Duration::seconds(30));
        assert_eq!(retry, SendGate::Deferred(minutes(2) + Duration::seconds(30)));
    }

    #[test]
    fn test_recent_send_defers_even_when_window_open() {
        let mut scheduler = scheduler();
        scheduler.commit_sent(now() - minutes(2));
        // Force the window open while the last send is still recent
        scheduler.state.next_allowed_at = None;

        let gate = scheduler.should_send(now());
        assert_eq!(gate, SendGate::Deferred(minutes(1)));
    }

    #[test]
    fn test_window_reopens_after_interval() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.should_send(now()), SendGate::Allowed);
        scheduler.commit_sent(now());

        let later = now() + minutes(3);
        assert_eq!(scheduler.should_send(later), SendGate::Allowed);
    }

    #[test]
    fn test_failed_send_leaves_last_sent_untouched() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.should_send(now()), SendGate::Allowed);
        // No commit_sent: the send failed

        assert_eq!(scheduler.state().last_sent_at, None);
        // The armed window still defers the retry to the next tick
        let retry = scheduler.should_send(now() + minutes(1));
        assert!(matches!(retry, SendGate::Deferred(_)));
        // And the window eventually reopens without a successful send
        assert_eq!(scheduler.should_send(now() + minutes(3)), SendGate::Allowed);
    }

    #[test]
    fn test_commit_advances_both_timestamps() {
        let mut scheduler = scheduler();
        scheduler.should_send(now());
        scheduler.commit_sent(now());

        assert_eq!(scheduler.state().last_sent_at, Some(now()));
        assert_eq!(scheduler.state().next_allowed_at, Some(now() + minutes(3)));
    }

    #[test]
    fn test_remaining_wait() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.remaining_wait(now()), None);

        scheduler.should_send(now());
        assert_eq!(
            scheduler.remaining_wait(now() + minutes(1)),
            Some(minutes(2))
        );
        assert_eq!(scheduler.remaining_wait(now() + minutes(3)), None);
    }
}
