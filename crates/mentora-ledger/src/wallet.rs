//! Wallet document

use chrono::{DateTime, Utc};
use mentora_types::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// The per-account ledger document: spendable balance, lifetime aggregates,
/// and the embedded transaction history in application order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub account_id: AccountId,
    pub balance: Decimal,
    pub currency: Currency,
    /// Sum of absolute values of applied debits
    pub total_spent: Decimal,
    /// Sum of applied top-up credits (refunds and bonuses excluded)
    pub total_topups: Decimal,
    /// Insertion order is application order; replaying the applied entries
    /// in order must reproduce every `balance_after` snapshot
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Open an empty wallet for an account
    pub fn open(account_id: AccountId, currency: Currency, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            balance: Decimal::ZERO,
            currency,
            total_spent: Decimal::ZERO,
            total_topups: Decimal::ZERO,
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read-model view without the embedded history
    pub fn summary(&self) -> WalletSummary {
        WalletSummary {
            account_id: self.account_id.clone(),
            balance: self.balance,
            currency: self.currency.clone(),
            total_spent: self.total_spent,
            total_topups: self.total_topups,
            transaction_count: self.transactions.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Wallet state exposed to callers, without the transaction array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub account_id: AccountId,
    pub balance: Decimal,
    pub currency: Currency,
    pub total_spent: Decimal,
    pub total_topups: Decimal,
    pub transaction_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
