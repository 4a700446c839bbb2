//! Mentora Types - Canonical domain types for the wallet core
//!
//! This crate contains the foundational types shared by the ledger, coupon,
//! limiter, and billing crates, with zero dependencies on other mentora
//! crates:
//!
//! - Identity types (AccountId, TransactionId, CouponId, OrderId)
//! - Currency unit tag
//! - Actor context carried in from the authentication layer
//! - Clock abstraction so time-dependent logic is testable
//! - Storage error taxonomy shared by every store trait
//!
//! # Architectural Invariants
//!
//! 1. Money-impacting errors are always explicit and typed
//! 2. Generated ids never collide with caller-supplied ids
//! 3. No component reads the wall clock directly; time flows through `Clock`

pub mod clock;
pub mod currency;
pub mod error;
pub mod identity;

pub use clock::*;
pub use currency::*;
pub use error::*;
pub use identity::*;
