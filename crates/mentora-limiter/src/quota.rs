//! Quota state shared by every account

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of a gated operation kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimitKind(pub String);

impl LimitKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// AI-evaluated mock interview sessions
    pub fn mock_interview() -> Self {
        Self::new("mock_interview")
    }

    /// Generated practice quizzes
    pub fn quiz() -> Self {
        Self::new("quiz")
    }

    /// Adaptive revision plan builds
    pub fn adaptive_revision() -> Self {
        Self::new("adaptive_revision")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LimitKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One kind's daily allowance and spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub max: u32,
    pub current: u32,
}

impl Quota {
    pub fn new(max: u32) -> Self {
        Self { max, current: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.max
    }
}

/// The singleton limit configuration
///
/// `last_reset` is stamped at creation and at each day rollover; comparing
/// its UTC calendar date against the current one decides when counters
/// restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyQuotas {
    pub quotas: HashMap<LimitKind, Quota>,
    pub last_reset: DateTime<Utc>,
}

impl DailyQuotas {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            quotas: HashMap::new(),
            last_reset: now,
        }
    }

    /// Zero every kind's counter if the UTC date moved past `last_reset`
    ///
    /// The reset covers all kinds in one step, whichever kind's claim
    /// triggered it. Returns whether a rollover happened.
    pub fn roll_over(&mut self, now: DateTime<Utc>) -> bool {
        if self.last_reset.date_naive() == now.date_naive() {
            return false;
        }
        for quota in self.quotas.values_mut() {
            quota.current = 0;
        }
        self.last_reset = now;
        true
    }

    /// The counters as a claim arriving at `now` would see them
    ///
    /// Read-only projection for dashboards; nothing is persisted.
    pub fn effective(&self, now: DateTime<Utc>) -> DailyQuotas {
        let mut snapshot = self.clone();
        snapshot.roll_over(now);
        snapshot
    }
}
