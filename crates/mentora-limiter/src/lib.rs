//! Mentora Limiter - System-wide daily caps on named operation kinds
//!
//! The limiter is:
//! - Global (one shared counter per kind across all accounts, not per user)
//! - Daily (counters reset lazily on the first claim after a UTC date change)
//! - Permissive by default (an unconfigured kind admits without counting,
//!   admins bypass the gate entirely, and storage failures admit rather than
//!   block)
//!
//! # Invariants
//!
//! 1. At most `max` slots are claimed per kind per calendar day; claiming is
//!    a single atomic increment-then-check at the store
//! 2. A rejected claim consumes nothing
//! 3. Day rollover zeroes the counters of every configured kind at once,
//!    triggered by whichever claim arrives first after midnight
//!
//! Rejection is the only error a caller has to handle on the hot path; a
//! broken store turns into a logged fail-open admission.

pub mod limiter;
pub mod quota;
pub mod store;

pub use limiter::{Admission, GlobalLimiter};
pub use quota::{DailyQuotas, LimitKind, Quota};
pub use store::{ClaimOutcome, InMemoryQuotaStore, QuotaStore};

use mentora_types::StorageError;
use thiserror::Error;

/// Errors that can occur in limiter operations
#[derive(Debug, Clone, Error)]
pub enum LimiterError {
    #[error("Daily limit reached for {kind}: at most {max} per day")]
    LimitExceeded { kind: LimitKind, max: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LimiterError {
    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, LimiterError>;
