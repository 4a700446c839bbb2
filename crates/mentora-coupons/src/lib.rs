//! Mentora Coupons - Discount validation, pricing, and redemption bookkeeping
//!
//! A coupon is:
//! - Code-addressed (codes are unique and case-insensitive; stored uppercase)
//! - Window-bound (usable only inside `[valid_from, valid_to]` while active)
//! - Counted (a global usage cap plus a per-account cap, tracked through an
//!   embedded usage record list)
//!
//! Validation and discount math are pure; only `redeem` and `release` write.
//!
//! # Invariants
//!
//! 1. `used_count` never exceeds `usage_limit` when one is set
//! 2. One successful redemption appends exactly one usage record and bumps
//!    `used_count` by exactly one; a rejection writes nothing
//! 3. A computed discount always lies in `[0, amount]`
//! 4. `release` removes exactly the usage it is handed, so a compensated
//!    redemption leaves the coupon as if it never happened

pub mod coupon;
pub mod engine;
pub mod store;

pub use coupon::{Coupon, CouponRejection, CouponUsage, Discount, NewCoupon, Quote};
pub use engine::{CouponEngine, Redemption};
pub use store::{CouponStore, InMemoryCouponStore};

use mentora_types::StorageError;
use thiserror::Error;

/// Errors that can occur in coupon operations
#[derive(Debug, Clone, Error)]
pub enum CouponError {
    #[error("Coupon not found: {code}")]
    NotFound { code: String },

    #[error("Coupon {code} rejected: {reason}")]
    Rejected { code: String, reason: CouponRejection },

    #[error("Coupon code already exists: {code}")]
    DuplicateCode { code: String },

    #[error("Invalid coupon definition: {message}")]
    InvalidDefinition { message: String },

    #[error("No redemption of {code} recorded for order {order_id}")]
    UsageNotFound { code: String, order_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CouponError {
    fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
        }
    }

    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "COUPON_NOT_FOUND",
            Self::Rejected { reason, .. } => reason.error_code(),
            Self::DuplicateCode { .. } => "COUPON_DUPLICATE_CODE",
            Self::InvalidDefinition { .. } => "COUPON_INVALID_DEFINITION",
            Self::UsageNotFound { .. } => "COUPON_USAGE_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CouponError>;
