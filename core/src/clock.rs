//! Wall-clock source — ledger writes take the clock as a parameter
//! instead of reading ambient time, so window math stays testable.

use chrono::{Local, NaiveDateTime, Timelike};

pub trait Clock {
    /// Current local time at second precision.
    fn now(&self) -> NaiveDateTime;
}

/// Production clock: local wall-clock, truncated to whole seconds.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Pinned clock for tests.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
