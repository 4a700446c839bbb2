//! Wallet events for the platform's notification fan-out
//!
//! Emitted best-effort on a broadcast channel; a full or subscriber-less
//! channel never fails the operation that produced the event.

use chrono::{DateTime, Utc};
use mentora_ledger::TxKind;
use mentora_types::{AccountId, OrderId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Events emitted as wallet state changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// A top-up was applied to the balance
    TopupCompleted {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Decimal,
        new_balance: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A debit went through
    WalletCharged {
        account_id: AccountId,
        transaction_id: TransactionId,
        kind: TxKind,
        amount: Decimal,
        new_balance: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A coupon usage was committed
    CouponRedeemed {
        account_id: AccountId,
        code: String,
        order_id: OrderId,
        discount: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// An administrator granted a bonus
    BonusGranted {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A previous charge was refunded
    RefundIssued {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Decimal,
        new_balance: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Balance was paid out of the platform
    WithdrawalRequested {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    },
}
