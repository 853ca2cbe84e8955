//! Time source for assignment timestamps and cookie expiry

use std::cell::Cell;

use chrono::{DateTime, Utc};

/// Wall-clock source.
pub trait Clock {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock backed by `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Create a clock frozen at the given epoch milliseconds.
    ///
    /// Out-of-range values clamp to the Unix epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    /// Advance the clock by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        self.now
            .set(self.now.get() + chrono::Duration::milliseconds(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
