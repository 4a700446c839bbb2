//! Clock abstraction
//!
//! Day-rollover and coupon-window logic must be testable without waiting for
//! midnight, so every component takes its notion of "now" from a `Clock`
//! rather than calling `Utc::now()` directly.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The current UTC calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Shared across components via `Arc<ManualClock>`; tests advance it to
/// simulate day rollover or coupon expiry.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at an explicit instant
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Start at the current wall-clock time
    pub fn starting_now() -> Self {
        Self::at(Utc::now())
    }

    /// Jump to an explicit instant
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write() = to;
    }

    /// Move forward by a duration
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Shared handle used throughout the workspace
pub type SharedClock = Arc<dyn Clock>;
