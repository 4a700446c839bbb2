//! Mentora Billing - The wallet facade the platform calls
//!
//! Everything the HTTP layer needs sits behind [`BillingService`]:
//! - Top-up flows with gateway hand-off, idempotent confirmation, and
//!   coupon discounting
//! - Charges, optionally gated by the global daily limiter
//! - Admin adjustments (bonuses, refunds, limits, coupon management)
//! - Best-effort wallet events for the notification fan-out
//!
//! # Invariants
//!
//! 1. A coupon redemption and the ledger write it pays for land together or
//!    not at all; the redemption is the reversible half and is rolled back
//!    when the ledger half fails
//! 2. Confirming the same gateway reference twice credits once; the second
//!    call replays the first receipt
//! 3. A discount covering the whole purchase never reaches the gateway; the
//!    full original amount is credited directly
//! 4. The coupon redeemed at confirmation is the one quoted when the top-up
//!    was begun; the pending record carries it

pub mod config;
pub mod events;
pub mod service;

pub use config::BillingConfig;
pub use events::WalletEvent;
pub use service::{BillingService, ChargeReceipt, TopupIntent};

use mentora_coupons::CouponError;
use mentora_ledger::LedgerError;
use mentora_limiter::LimiterError;
use thiserror::Error;

/// Errors surfaced by the billing facade
///
/// Component errors pass through unchanged so the caller sees the specific
/// domain failure (insufficient funds, the exact coupon rejection, the
/// exhausted limit).
#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Limiter(#[from] LimiterError),

    #[error("Administrator privileges required for {operation}")]
    AdminRequired { operation: &'static str },
}

impl BillingError {
    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Coupon(e) => e.error_code(),
            Self::Limiter(e) => e.error_code(),
            Self::AdminRequired { .. } => "ADMIN_REQUIRED",
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
