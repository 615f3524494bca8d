//! Time gate: the "do not act again before" guard carried by each attempt.
//!
//! A phase function that finds its gate closed must return its own phase
//! unchanged and issue nothing. Gates only ever move forward.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Earliest instant at which the next action may be taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGate {
    not_before: Option<DateTime<Utc>>,
}

impl TimeGate {
    /// A gate that is always open.
    #[must_use]
    pub const fn open() -> Self {
        Self { not_before: None }
    }

    /// Returns the instant the gate opens, or `None` if it was never set.
    #[must_use]
    pub const fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// Whether an action may be taken at `now`.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_none_or(|not_before| not_before <= now)
    }

    /// Closes the gate until `now + delay`.
    ///
    /// If the gate is already closed until later than that, it is left as is.
    #[must_use]
    pub fn hold(self, now: DateTime<Utc>, delay: TimeDelta) -> Self {
        let until = now + delay;
        match self.not_before {
            Some(existing) if existing >= until => self,
            _ => Self {
                not_before: Some(until),
            },
        }
    }
}
