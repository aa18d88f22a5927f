//! Clock abstraction for the scheduling loops.
//!
//! Every component that compares timestamps takes a `Clock` instead of
//! calling `Local::now()` directly, so scheduling policy is testable
//! without wall-clock waits.

use chrono::{Local, NaiveDateTime};
use std::sync::Mutex;

/// Source of "now" for due-work selection, materialization and escalation.
///
/// All timestamps in the scheduler are naive clinic-local datetimes, matching
/// how slot times ("08:00") are expressed by operators.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Production clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests and simulations.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        ManualClock {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to an absolute point in time.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
