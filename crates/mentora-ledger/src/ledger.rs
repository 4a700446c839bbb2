//! Ledger service
//!
//! All balance mutations flow through here. Each operation acquires the
//! account's write lock, loads the wallet document, applies the change, and
//! saves, so two concurrent debits against the same account can never both
//! succeed on a balance that covers only one.

use std::sync::Arc;

use dashmap::DashMap;
use mentora_types::{AccountId, Currency, SharedClock, TransactionId};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::store::WalletStore;
use crate::transaction::{Page, Receipt, Transaction, TxKind, TxStatus, MAX_PAGE_SIZE};
use crate::wallet::{Wallet, WalletSummary};
use crate::{LedgerError, Result};

/// Terminal outcome for a pending top-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Payment verified; apply the credit
    Completed,
    /// Payment failed or was abandoned; record and move on
    Failed,
}

/// The Mentora account ledger
///
/// Thread-safe and cheap to clone; clones share the store, clock, and the
/// per-account lock registry.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn WalletStore>,
    clock: SharedClock,
    currency: Currency,
    /// Per-account write locks; held across the load-mutate-save cycle
    locks: Arc<DashMap<AccountId, Arc<Mutex<()>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn WalletStore>, clock: SharedClock, currency: Currency) -> Self {
        Self {
            store,
            clock,
            currency,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn account_lock(&self, account_id: &AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_or_open(&self, account_id: &AccountId) -> Result<Wallet> {
        match self.store.load(account_id).await? {
            Some(wallet) => Ok(wallet),
            None => Ok(Wallet::open(
                account_id.clone(),
                self.currency.clone(),
                self.clock.now(),
            )),
        }
    }

    /// Fetch the wallet for an account, creating an empty one on first access
    ///
    /// Idempotent; never fails for domain reasons.
    pub async fn get_or_create(&self, account_id: &AccountId) -> Result<WalletSummary> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        match self.store.load(account_id).await? {
            Some(wallet) => Ok(wallet.summary()),
            None => {
                let wallet = Wallet::open(
                    account_id.clone(),
                    self.currency.clone(),
                    self.clock.now(),
                );
                self.store.save(&wallet).await?;
                Ok(wallet.summary())
            }
        }
    }

    /// Apply a credit to an account
    ///
    /// `kind` must be a credit kind; `amount` must be positive. A `reference`
    /// already present in the account's history is rejected so retried
    /// gateway callbacks cannot credit twice.
    pub async fn credit(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        kind: TxKind,
        description: impl Into<String>,
        reference: Option<String>,
    ) -> Result<Receipt> {
        if !kind.is_credit() {
            return Err(LedgerError::KindMismatch {
                kind,
                operation: "credit",
            });
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(
                "Credit amount must be greater than zero",
            ));
        }

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let mut wallet = self.load_or_open(account_id).await?;
        Self::ensure_unused_reference(&wallet, reference.as_deref())?;

        let new_balance = wallet
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        let now = self.clock.now();
        let transaction = Transaction {
            id: TransactionId::new(),
            kind,
            amount,
            description: description.into(),
            status: TxStatus::Completed,
            balance_after: new_balance,
            reference,
            coupon_code: None,
            created_at: now,
            updated_at: now,
        };
        let transaction_id = transaction.id.clone();

        wallet.balance = new_balance;
        if kind == TxKind::Topup {
            wallet.total_topups = wallet
                .total_topups
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        }
        wallet.updated_at = now;
        wallet.transactions.push(transaction);

        self.store.save(&wallet).await?;

        Ok(Receipt {
            transaction_id,
            new_balance,
        })
    }

    /// Apply a debit to an account
    ///
    /// Fails with `InsufficientFunds` when the balance does not cover the
    /// full amount; no partial debit is ever recorded.
    pub async fn debit(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Result<Receipt> {
        if !kind.is_debit() {
            return Err(LedgerError::KindMismatch {
                kind,
                operation: "debit",
            });
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(
                "Debit amount must be greater than zero",
            ));
        }

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let mut wallet = self.load_or_open(account_id).await?;

        if wallet.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: wallet.balance,
                requested: amount,
            });
        }
        let new_balance = wallet.balance - amount;

        let now = self.clock.now();
        let transaction = Transaction {
            id: TransactionId::new(),
            kind,
            amount: -amount,
            description: description.into(),
            status: TxStatus::Completed,
            balance_after: new_balance,
            reference: None,
            coupon_code: None,
            created_at: now,
            updated_at: now,
        };
        let transaction_id = transaction.id.clone();

        wallet.balance = new_balance;
        wallet.total_spent = wallet
            .total_spent
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        wallet.updated_at = now;
        wallet.transactions.push(transaction);

        self.store.save(&wallet).await?;

        Ok(Receipt {
            transaction_id,
            new_balance,
        })
    }

    /// Record a top-up awaiting external payment verification
    ///
    /// The balance is untouched until `settle_topup` completes it. A coupon
    /// code given here rides on the pending record so the settlement step
    /// can read back what was quoted.
    pub async fn begin_topup(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        reference: Option<String>,
        coupon_code: Option<String>,
    ) -> Result<Receipt> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(
                "Top-up amount must be greater than zero",
            ));
        }

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let mut wallet = self.load_or_open(account_id).await?;
        Self::ensure_unused_reference(&wallet, reference.as_deref())?;

        let now = self.clock.now();
        let transaction = Transaction {
            id: TransactionId::new(),
            kind: TxKind::Topup,
            amount,
            description: "Wallet top-up".to_string(),
            status: TxStatus::Pending,
            balance_after: wallet.balance,
            reference,
            coupon_code,
            created_at: now,
            updated_at: now,
        };
        let transaction_id = transaction.id.clone();

        wallet.updated_at = now;
        wallet.transactions.push(transaction);
        self.store.save(&wallet).await?;

        Ok(Receipt {
            transaction_id,
            new_balance: wallet.balance,
        })
    }

    /// Move a pending top-up to its terminal status
    ///
    /// Completing applies the credit and moves the record to the tail of
    /// the history, so stored order stays the order in which transactions
    /// were applied even when spends landed between begin and settle;
    /// `balance_after` and `updated_at` are re-stamped on the way. Failing
    /// leaves the balance and the record's position untouched. Any
    /// transition from a non-pending status is rejected. A `reference`
    /// given here (the gateway id, known only once payment settles) is
    /// stamped onto the transaction after the usual duplicate check.
    pub async fn settle_topup(
        &self,
        account_id: &AccountId,
        transaction_id: &TransactionId,
        outcome: SettleOutcome,
        reference: Option<String>,
    ) -> Result<Receipt> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let mut wallet = self
            .store
            .load(account_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })?;

        let position = wallet
            .transactions
            .iter()
            .position(|t| &t.id == transaction_id)
            .ok_or_else(|| LedgerError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })?;

        if let Some(reference) = reference.as_deref() {
            let taken = wallet
                .transactions
                .iter()
                .enumerate()
                .any(|(i, t)| i != position && t.reference.as_deref() == Some(reference));
            if taken {
                return Err(LedgerError::DuplicateReference {
                    reference: reference.to_string(),
                });
            }
        }

        let current_status = wallet.transactions[position].status;
        if current_status != TxStatus::Pending {
            return Err(LedgerError::InvalidStatusTransition {
                from: current_status,
                to: match outcome {
                    SettleOutcome::Completed => TxStatus::Completed,
                    SettleOutcome::Failed => TxStatus::Failed,
                },
            });
        }

        let now = self.clock.now();
        let new_balance = match outcome {
            SettleOutcome::Completed => {
                let mut transaction = wallet.transactions.remove(position);
                let new_balance = wallet
                    .balance
                    .checked_add(transaction.amount)
                    .ok_or(LedgerError::Overflow)?;

                transaction.status = TxStatus::Completed;
                transaction.balance_after = new_balance;
                transaction.updated_at = now;
                if reference.is_some() {
                    transaction.reference = reference;
                }

                wallet.balance = new_balance;
                wallet.total_topups = wallet
                    .total_topups
                    .checked_add(transaction.amount)
                    .ok_or(LedgerError::Overflow)?;
                wallet.transactions.push(transaction);
                new_balance
            }
            SettleOutcome::Failed => {
                let transaction = &mut wallet.transactions[position];
                transaction.status = TxStatus::Failed;
                transaction.updated_at = now;
                if reference.is_some() {
                    transaction.reference = reference;
                }
                wallet.balance
            }
        };

        wallet.updated_at = now;
        self.store.save(&wallet).await?;

        Ok(Receipt {
            transaction_id: transaction_id.clone(),
            new_balance,
        })
    }

    /// Newest-first transaction listing; pure read
    ///
    /// `page` is 1-based; `page_size` is clamped to [1, MAX_PAGE_SIZE].
    pub async fn transactions(
        &self,
        account_id: &AccountId,
        page: u32,
        page_size: u32,
        kind: Option<TxKind>,
    ) -> Result<Page<Transaction>> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let wallet = self.store.load(account_id).await?;
        let transactions = wallet.map(|w| w.transactions).unwrap_or_default();

        let matches = |t: &Transaction| kind.map_or(true, |k| t.kind == k);
        let total = transactions.iter().filter(|t| matches(t)).count() as u64;

        let skip = (page as usize - 1) * page_size as usize;
        let items = transactions
            .iter()
            .rev()
            .filter(|t| matches(t))
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    /// Look up one transaction by id
    pub async fn transaction(
        &self,
        account_id: &AccountId,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>> {
        let wallet = self.store.load(account_id).await?;
        Ok(wallet.and_then(|w| {
            w.transactions
                .iter()
                .find(|t| &t.id == transaction_id)
                .cloned()
        }))
    }

    /// Look up a transaction by its external payment reference
    pub async fn find_by_reference(
        &self,
        account_id: &AccountId,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        let wallet = self.store.load(account_id).await?;
        Ok(wallet.and_then(|w| {
            w.transactions
                .iter()
                .find(|t| t.reference.as_deref() == Some(reference))
                .cloned()
        }))
    }

    /// Wallet snapshot, if the account has one
    pub async fn wallet(&self, account_id: &AccountId) -> Result<Option<WalletSummary>> {
        Ok(self.store.load(account_id).await?.map(|w| w.summary()))
    }

    /// Spendable balance; zero for accounts that have never been touched
    pub async fn balance(&self, account_id: &AccountId) -> Result<Decimal> {
        Ok(self
            .store
            .load(account_id)
            .await?
            .map(|w| w.balance)
            .unwrap_or(Decimal::ZERO))
    }

    fn ensure_unused_reference(wallet: &Wallet, reference: Option<&str>) -> Result<()> {
        if let Some(reference) = reference {
            if wallet
                .transactions
                .iter()
                .any(|t| t.reference.as_deref() == Some(reference))
            {
                return Err(LedgerError::DuplicateReference {
                    reference: reference.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryWalletStore;
    use chrono::TimeZone;
    use mentora_types::{Clock, ManualClock};
    use rust_decimal_macros::dec;

    fn test_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at(
            chrono::Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap(),
        ))
    }

    fn test_ledger() -> Ledger {
        Ledger::new(
            Arc::new(InMemoryWalletStore::new()),
            test_clock(),
            Currency::inr(),
        )
    }

    fn account() -> AccountId {
        AccountId::from_string("user-1")
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let ledger = test_ledger();
        let account = account();

        let first = ledger.get_or_create(&account).await.unwrap();
        assert_eq!(first.balance, Decimal::ZERO);
        assert_eq!(first.transaction_count, 0);

        ledger
            .credit(&account, dec!(100), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();

        let second = ledger.get_or_create(&account).await.unwrap();
        assert_eq!(second.balance, dec!(100));
        assert_eq!(second.transaction_count, 1);
    }

    #[tokio::test]
    async fn test_credit_debit_sequence_with_snapshots() {
        let ledger = test_ledger();
        let account = account();

        // Credit 500, debit 200, then an uncoverable 400 debit
        let receipt = ledger
            .credit(&account, dec!(500), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();
        assert_eq!(receipt.new_balance, dec!(500));

        let receipt = ledger
            .debit(&account, dec!(200), TxKind::CallCharge, "Mentor call")
            .await
            .unwrap();
        assert_eq!(receipt.new_balance, dec!(300));

        let result = ledger
            .debit(&account, dec!(400), TxKind::CallCharge, "Mentor call")
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                available,
                requested,
            }) if available == dec!(300) && requested == dec!(400)
        ));

        let wallet = ledger.wallet(&account).await.unwrap().unwrap();
        assert_eq!(wallet.balance, dec!(300));
        assert_eq!(wallet.total_spent, dec!(200));
        assert_eq!(wallet.total_topups, dec!(500));
        assert_eq!(wallet.transaction_count, 2);

        let history = ledger.transactions(&account, 1, 10, None).await.unwrap();
        assert_eq!(history.items.len(), 2);
        // Newest first
        assert_eq!(history.items[0].balance_after, dec!(300));
        assert_eq!(history.items[0].amount, dec!(-200));
        assert_eq!(history.items[1].balance_after, dec!(500));
        assert_eq!(history.items[1].amount, dec!(500));
    }

    #[tokio::test]
    async fn test_balance_equals_running_sum() {
        let ledger = test_ledger();
        let account = account();

        ledger
            .credit(&account, dec!(500), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();
        ledger
            .debit(&account, dec!(120), TxKind::DoubtCharge, "Doubt session")
            .await
            .unwrap();
        ledger
            .credit(&account, dec!(50), TxKind::Bonus, "Welcome bonus", None)
            .await
            .unwrap();
        ledger
            .debit(&account, dec!(75), TxKind::Withdrawal, "Payout")
            .await
            .unwrap();
        ledger
            .credit(&account, dec!(120), TxKind::Refund, "Cancelled session", None)
            .await
            .unwrap();

        let history = ledger.transactions(&account, 1, 100, None).await.unwrap();
        let mut running = Decimal::ZERO;
        // Oldest first for replay
        for transaction in history.items.iter().rev() {
            assert!(transaction.status.is_applied());
            running += transaction.amount;
            assert_eq!(transaction.balance_after, running);
        }
        assert_eq!(ledger.balance(&account).await.unwrap(), running);

        let wallet = ledger.wallet(&account).await.unwrap().unwrap();
        assert_eq!(wallet.total_spent, dec!(195));
        assert_eq!(wallet.total_topups, dec!(500));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let ledger = test_ledger();
        let account = account();

        let result = ledger
            .credit(&account, Decimal::ZERO, TxKind::Topup, "Top-up", None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));

        let result = ledger
            .debit(&account, dec!(-5), TxKind::CallCharge, "Mentor call")
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_rejects_mismatched_kind() {
        let ledger = test_ledger();
        let account = account();

        let result = ledger
            .credit(&account, dec!(10), TxKind::CallCharge, "oops", None)
            .await;
        assert!(matches!(result, Err(LedgerError::KindMismatch { .. })));

        let result = ledger.debit(&account, dec!(10), TxKind::Topup, "oops").await;
        assert!(matches!(result, Err(LedgerError::KindMismatch { .. })));
    }

    #[tokio::test]
    async fn test_failed_debit_leaves_no_record() {
        let ledger = test_ledger();
        let account = account();

        ledger
            .credit(&account, dec!(100), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();

        let result = ledger
            .debit(&account, dec!(101), TxKind::InterviewCharge, "Mock interview")
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));

        let history = ledger.transactions(&account, 1, 10, None).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(ledger.balance(&account).await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_pending_topup_lifecycle() {
        let ledger = test_ledger();
        let account = account();

        let receipt = ledger
            .begin_topup(&account, dec!(250), None, Some("LAUNCH50".to_string()))
            .await
            .unwrap();
        // Not applied yet
        assert_eq!(receipt.new_balance, Decimal::ZERO);
        assert_eq!(ledger.balance(&account).await.unwrap(), Decimal::ZERO);

        let pending = ledger
            .transaction(&account, &receipt.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.status, TxStatus::Pending);

        let settled = ledger
            .settle_topup(
                &account,
                &receipt.transaction_id,
                SettleOutcome::Completed,
                Some("pay_abc".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(settled.new_balance, dec!(250));

        let transaction = ledger
            .find_by_reference(&account, "pay_abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(transaction.status, TxStatus::Completed);
        assert_eq!(transaction.balance_after, dec!(250));
        // The attached coupon survives settlement
        assert_eq!(transaction.coupon_code.as_deref(), Some("LAUNCH50"));

        let wallet = ledger.wallet(&account).await.unwrap().unwrap();
        assert_eq!(wallet.total_topups, dec!(250));

        // A settled transaction cannot be settled again
        let result = ledger
            .settle_topup(
                &account,
                &receipt.transaction_id,
                SettleOutcome::Completed,
                None,
            )
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_settle_after_interleaved_debit_keeps_replay_order() {
        let clock = test_clock();
        let ledger = Ledger::new(
            Arc::new(InMemoryWalletStore::new()),
            clock.clone(),
            Currency::inr(),
        );
        let account = account();

        ledger
            .credit(&account, dec!(50), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();
        let pending = ledger
            .begin_topup(&account, dec!(100), None, None)
            .await
            .unwrap();
        // A spend lands while the gateway still holds the payment
        ledger
            .debit(&account, dec!(30), TxKind::CallCharge, "Mentor call")
            .await
            .unwrap();

        clock.advance(chrono::Duration::hours(1));
        let settled = ledger
            .settle_topup(
                &account,
                &pending.transaction_id,
                SettleOutcome::Completed,
                Some("pay_mid".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(settled.new_balance, dec!(120));

        // The credit applied last, so it sits at the tail of the history
        let history = ledger.transactions(&account, 1, 10, None).await.unwrap();
        assert_eq!(history.items[0].id, pending.transaction_id);
        assert_eq!(history.items[0].updated_at, clock.now());
        assert_eq!(
            history.items[0].created_at,
            clock.now() - chrono::Duration::hours(1)
        );

        // Replaying applied entries in stored order reproduces every snapshot
        let mut running = Decimal::ZERO;
        for transaction in history.items.iter().rev() {
            assert!(transaction.status.is_applied());
            running += transaction.amount;
            assert_eq!(transaction.balance_after, running);
        }
        assert_eq!(running, dec!(120));
    }

    #[tokio::test]
    async fn test_failed_topup_never_applies() {
        let ledger = test_ledger();
        let account = account();

        let receipt = ledger
            .begin_topup(&account, dec!(250), Some("pay_fail".to_string()), None)
            .await
            .unwrap();
        ledger
            .settle_topup(&account, &receipt.transaction_id, SettleOutcome::Failed, None)
            .await
            .unwrap();

        assert_eq!(ledger.balance(&account).await.unwrap(), Decimal::ZERO);
        let wallet = ledger.wallet(&account).await.unwrap().unwrap();
        assert_eq!(wallet.total_topups, Decimal::ZERO);

        let transaction = ledger
            .find_by_reference(&account, "pay_fail")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(transaction.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let ledger = test_ledger();
        let account = account();

        ledger
            .credit(
                &account,
                dec!(100),
                TxKind::Topup,
                "Top-up",
                Some("pay_1".to_string()),
            )
            .await
            .unwrap();

        let result = ledger
            .credit(
                &account,
                dec!(100),
                TxKind::Topup,
                "Top-up",
                Some("pay_1".to_string()),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::DuplicateReference { .. })));
        assert_eq!(ledger.balance(&account).await.unwrap(), dec!(100));

        // Settling cannot claim a reference another transaction holds
        let pending = ledger
            .begin_topup(&account, dec!(50), None, None)
            .await
            .unwrap();
        let result = ledger
            .settle_topup(
                &account,
                &pending.transaction_id,
                SettleOutcome::Completed,
                Some("pay_1".to_string()),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::DuplicateReference { .. })));
        assert_eq!(ledger.balance(&account).await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_pagination_and_filtering() {
        let ledger = test_ledger();
        let account = account();

        ledger
            .credit(&account, dec!(1000), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();
        for i in 0..5 {
            ledger
                .debit(
                    &account,
                    dec!(10),
                    TxKind::CallCharge,
                    format!("Call {}", i),
                )
                .await
                .unwrap();
        }

        let page = ledger
            .transactions(&account, 1, 2, Some(TxKind::CallCharge))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 3);
        // Newest first
        assert_eq!(page.items[0].description, "Call 4");
        assert_eq!(page.items[1].description, "Call 3");

        let last = ledger
            .transactions(&account, 3, 2, Some(TxKind::CallCharge))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].description, "Call 0");

        let topups = ledger
            .transactions(&account, 1, 10, Some(TxKind::Topup))
            .await
            .unwrap();
        assert_eq!(topups.total, 1);
    }

    #[tokio::test]
    async fn test_concurrent_debits_single_winner() {
        let ledger = test_ledger();
        let account = account();

        ledger
            .credit(&account, dec!(100), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();

        let a = {
            let ledger = ledger.clone();
            let account = account.clone();
            tokio::spawn(async move {
                ledger
                    .debit(&account, dec!(60), TxKind::CallCharge, "Call A")
                    .await
            })
        };
        let b = {
            let ledger = ledger.clone();
            let account = account.clone();
            tokio::spawn(async move {
                ledger
                    .debit(&account, dec!(60), TxKind::CallCharge, "Call B")
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert_eq!(ledger.balance(&account).await.unwrap(), dec!(40));

        let history = ledger.transactions(&account, 1, 10, None).await.unwrap();
        assert_eq!(history.total, 2);
    }

    #[tokio::test]
    async fn test_clock_drives_timestamps() {
        let clock = test_clock();
        let ledger = Ledger::new(
            Arc::new(InMemoryWalletStore::new()),
            clock.clone(),
            Currency::inr(),
        );
        let account = account();

        ledger
            .credit(&account, dec!(10), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();
        clock.advance(chrono::Duration::days(1));
        ledger
            .credit(&account, dec!(10), TxKind::Topup, "Top-up", None)
            .await
            .unwrap();

        let history = ledger.transactions(&account, 1, 10, None).await.unwrap();
        assert_eq!(
            history.items[0].created_at - history.items[1].created_at,
            chrono::Duration::days(1)
        );
        assert_eq!(history.items[0].created_at, clock.now());
    }
}
