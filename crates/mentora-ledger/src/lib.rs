//! Mentora Ledger - Per-account wallet balances and transaction history
//!
//! The ledger is:
//! - Account-keyed (one wallet document per authenticated user)
//! - Append-only (applied transactions are never deleted or rewritten)
//! - Snapshot-carrying (every applied transaction stores the balance it left
//!   behind, so the history can be replayed and audited)
//!
//! # Invariants
//!
//! 1. No negative balances; a debit that cannot be covered fails whole
//! 2. `balance` equals the running sum of signed amounts of applied
//!    transactions
//! 3. `total_spent` / `total_topups` only ever grow
//! 4. Pending top-ups touch the balance only when settled
//! 5. Applied transactions are stored in the order they were applied; a
//!    pending top-up takes its place in the history at settlement
//!
//! Read-modify-write cycles are serialized per account; no cross-account
//! atomicity is provided or needed.

pub mod ledger;
pub mod store;
pub mod transaction;
pub mod wallet;

pub use ledger::{Ledger, SettleOutcome};
pub use store::{InMemoryWalletStore, WalletStore};
pub use transaction::{Page, Receipt, Transaction, TxKind, TxStatus, MAX_PAGE_SIZE};
pub use wallet::{Wallet, WalletSummary};

use mentora_types::StorageError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Transaction kind {kind} cannot be recorded as a {operation}")]
    KindMismatch {
        kind: TxKind,
        operation: &'static str,
    },

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: String },

    #[error("External reference already recorded: {reference}")]
    DuplicateReference { reference: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: TxStatus, to: TxStatus },

    #[error("Balance arithmetic overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::KindMismatch { .. } => "KIND_MISMATCH",
            Self::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::Overflow => "BALANCE_OVERFLOW",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
