//! Transaction records and listing types

use chrono::{DateTime, Utc};
use mentora_types::TransactionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page a transaction listing will return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Classification of a wallet transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Balance purchased through the payment gateway
    Topup,
    /// Spend on a mentor call
    CallCharge,
    /// Spend on a doubt session
    DoubtCharge,
    /// Spend on a mock interview
    InterviewCharge,
    /// Money returned to the wallet after a cancelled or disputed spend
    Refund,
    /// Promotional or goodwill credit granted by staff
    Bonus,
    /// Balance paid out of the platform
    Withdrawal,
}

impl TxKind {
    /// Kinds that add to the balance
    pub fn is_credit(&self) -> bool {
        matches!(self, TxKind::Topup | TxKind::Refund | TxKind::Bonus)
    }

    /// Kinds that subtract from the balance
    pub fn is_debit(&self) -> bool {
        !self.is_credit()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Topup => "topup",
            TxKind::CallCharge => "call_charge",
            TxKind::DoubtCharge => "doubt_charge",
            TxKind::InterviewCharge => "interview_charge",
            TxKind::Refund => "refund",
            TxKind::Bonus => "bonus",
            TxKind::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Recorded, awaiting external payment verification; not applied
    Pending,
    /// Applied to the balance
    Completed,
    /// Verification failed; never applied
    Failed,
    /// Applied, later compensated by a separate refund transaction
    Refunded,
}

impl TxStatus {
    /// Whether a transaction in this status has been applied to the balance
    pub fn is_applied(&self) -> bool {
        matches!(self, TxStatus::Completed | TxStatus::Refunded)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
            TxStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// A single wallet transaction
///
/// `amount` is signed: credits are positive, debits negative. For applied
/// transactions `balance_after` is the wallet balance immediately after
/// application; for pending/failed ones it is the balance at recording time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: String,
    pub status: TxStatus,
    pub balance_after: Decimal,
    /// External payment reference (gateway transaction id); used as the
    /// idempotency key for retried top-up verification
    pub reference: Option<String>,
    /// Coupon code attached when a discounted top-up was begun; read back
    /// at settlement so the confirmation step cannot substitute another
    pub coupon_code: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last status change; equals `created_at` until a pending top-up settles
    pub updated_at: DateTime<Utc>,
}

/// Acknowledgement returned by balance-mutating operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub new_balance: Decimal,
}

/// One page of a newest-first listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Total records matching the filter, across all pages
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.total + self.page_size as u64 - 1) / self.page_size as u64) as u32
    }
}
