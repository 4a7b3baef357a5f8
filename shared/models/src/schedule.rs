use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps gating email sends.
///
/// Invariant: `next_allowed_at`, once set, only moves forward: it is armed
/// ahead of a send attempt and advanced again after a successful send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub last_sent_at: Option<DateTime<Utc>>,
    pub next_allowed_at: Option<DateTime<Utc>>,
}

/// Outcome of the scheduler gate for one evaluation cycle.
///
/// `Deferred` is an expected state, not an error; it carries the remaining
/// wait so it can be surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendGate {
    Allowed,
    Deferred(Duration),
}

impl SendGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SendGate::Allowed)
    }
}

impl std::fmt::Display for SendGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Deferred(remaining) => {
                write!(f, "deferred for {}m{}s", remaining.num_minutes(), remaining.num_seconds() % 60)
            }
        }
    }
}
