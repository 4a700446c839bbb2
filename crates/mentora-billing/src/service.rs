//! Billing service
//!
//! Orchestrates the ledger, coupon engine, and global limiter behind one
//! facade. The coupon-plus-ledger unit of work runs as a saga: the coupon
//! redemption commits first because it is the half that can be rolled back;
//! the ledger write commits second because it is append-only and cannot.

use std::sync::Arc;

use mentora_coupons::{
    Coupon, CouponEngine, CouponError, InMemoryCouponStore, NewCoupon, Quote, Redemption,
};
use mentora_ledger::{
    InMemoryWalletStore, Ledger, LedgerError, Page, Receipt, SettleOutcome, Transaction, TxKind,
    WalletSummary,
};
use mentora_limiter::{Admission, DailyQuotas, GlobalLimiter, InMemoryQuotaStore, LimitKind};
use mentora_types::{AccountId, Actor, OrderId, SharedClock, TransactionId};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::events::WalletEvent;
use crate::{BillingError, Result};

/// What `begin_topup` decided
#[derive(Debug, Clone)]
pub enum TopupIntent {
    /// `payable` is due at the gateway; `confirm_topup` or `fail_topup`
    /// settles the pending transaction
    AwaitingPayment {
        transaction_id: TransactionId,
        amount: Decimal,
        discount: Decimal,
        payable: Decimal,
    },
    /// The discount covered the whole purchase; the wallet is already
    /// credited and no gateway step happens
    Credited {
        transaction_id: TransactionId,
        new_balance: Decimal,
        discount: Decimal,
    },
}

/// Receipt for a charge, with how the gate admitted it
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub receipt: Receipt,
    /// `None` when the charge was not gated
    pub admission: Option<Admission>,
}

/// The wallet facade the platform's HTTP layer calls
#[derive(Clone)]
pub struct BillingService {
    ledger: Ledger,
    coupons: CouponEngine,
    limiter: GlobalLimiter,
    clock: SharedClock,
    events: broadcast::Sender<WalletEvent>,
}

impl BillingService {
    pub fn new(
        ledger: Ledger,
        coupons: CouponEngine,
        limiter: GlobalLimiter,
        clock: SharedClock,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            ledger,
            coupons,
            limiter,
            clock,
            events,
        }
    }

    /// Fully in-memory instance with the config's daily limits seeded
    pub async fn in_memory(config: BillingConfig, clock: SharedClock) -> Result<Self> {
        let ledger = Ledger::new(
            Arc::new(InMemoryWalletStore::new()),
            clock.clone(),
            config.currency.clone(),
        );
        let coupons = CouponEngine::new(Arc::new(InMemoryCouponStore::new()), clock.clone());
        let limiter = GlobalLimiter::new(Arc::new(InMemoryQuotaStore::new()), clock.clone());
        for (kind, max) in &config.daily_limits {
            limiter.configure(kind, *max).await?;
        }
        Ok(Self::new(
            ledger,
            coupons,
            limiter,
            clock,
            config.event_capacity,
        ))
    }

    /// Subscribe to wallet events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    fn require_admin(&self, actor: &Actor, operation: &'static str) -> Result<()> {
        if actor.is_admin {
            Ok(())
        } else {
            Err(BillingError::AdminRequired { operation })
        }
    }

    // ----- wallet reads -----

    /// The actor's wallet, created empty on first access
    pub async fn wallet(&self, account_id: &AccountId) -> Result<WalletSummary> {
        Ok(self.ledger.get_or_create(account_id).await?)
    }

    /// Spendable balance; zero for untouched accounts
    pub async fn balance(&self, account_id: &AccountId) -> Result<Decimal> {
        Ok(self.ledger.balance(account_id).await?)
    }

    /// Newest-first transaction history
    pub async fn transactions(
        &self,
        account_id: &AccountId,
        page: u32,
        page_size: u32,
        kind: Option<TxKind>,
    ) -> Result<Page<Transaction>> {
        Ok(self
            .ledger
            .transactions(account_id, page, page_size, kind)
            .await?)
    }

    // ----- top-up flow -----

    /// Price a top-up without committing anything
    pub async fn quote_topup(
        &self,
        actor: &Actor,
        amount: Decimal,
        code: Option<&str>,
    ) -> Result<Quote> {
        match code {
            Some(code) => Ok(self.coupons.quote(code, &actor.account_id, amount).await?),
            None => Ok(Quote::valid(String::new(), amount, Decimal::ZERO)),
        }
    }

    /// Start a top-up of `amount`, optionally discounted by a coupon
    ///
    /// A discount covering the whole amount bypasses the gateway: the full
    /// original amount is credited and the coupon redeemed in one unit of
    /// work. Otherwise a pending transaction is recorded, carrying the
    /// quoted coupon code for the confirmation step, and the payable amount
    /// is returned for the gateway hand-off.
    pub async fn begin_topup(
        &self,
        actor: &Actor,
        amount: Decimal,
        code: Option<&str>,
    ) -> Result<TopupIntent> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                message: "Top-up amount must be greater than zero".to_string(),
            }
            .into());
        }

        let quote = self.quote_topup(actor, amount, code).await?;
        if let Some(reason) = quote.reason {
            return Err(CouponError::Rejected {
                code: quote.code,
                reason,
            }
            .into());
        }

        if code.is_some() && quote.is_free() {
            return self.free_topup(actor, amount, &quote.code).await;
        }

        let coupon_code = code.is_some().then(|| quote.code.clone());
        let receipt = self
            .ledger
            .begin_topup(&actor.account_id, amount, None, coupon_code)
            .await?;
        info!(
            account = %actor.account_id,
            transaction = %receipt.transaction_id,
            %amount,
            payable = %quote.final_amount,
            "top-up pending gateway payment"
        );
        Ok(TopupIntent::AwaitingPayment {
            transaction_id: receipt.transaction_id,
            amount,
            discount: quote.discount,
            payable: quote.final_amount,
        })
    }

    /// Fully-discounted path: redeem, then credit the original amount
    async fn free_topup(&self, actor: &Actor, amount: Decimal, code: &str) -> Result<TopupIntent> {
        let account_id = &actor.account_id;
        let order_id = mint_order_id();

        let redemption = self
            .coupons
            .redeem(code, account_id, &order_id, amount)
            .await?;

        let receipt = match self
            .ledger
            .credit(
                account_id,
                amount,
                TxKind::Topup,
                format!("Wallet top-up (coupon {code})"),
                None,
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(error) => {
                self.compensate_redemption(&redemption).await;
                return Err(error.into());
            }
        };

        info!(
            account = %account_id,
            transaction = %receipt.transaction_id,
            %amount,
            %code,
            "top-up fully covered by coupon, gateway skipped"
        );
        self.emit_redeemed(&redemption);
        self.emit(WalletEvent::TopupCompleted {
            account_id: account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            amount,
            new_balance: receipt.new_balance,
            timestamp: self.clock.now(),
        });
        Ok(TopupIntent::Credited {
            transaction_id: receipt.transaction_id,
            new_balance: receipt.new_balance,
            discount: redemption.discount,
        })
    }

    /// Settle a pending top-up after the gateway verified payment
    ///
    /// Idempotent on `gateway_ref`: a retried confirmation replays the first
    /// receipt and credits nothing. The coupon quoted at `begin_topup` is
    /// read back from the pending record, so a confirmation cannot drop or
    /// swap it. The redemption and the ledger settle form one unit of work;
    /// if the settle fails the redemption is released.
    pub async fn confirm_topup(
        &self,
        actor: &Actor,
        transaction_id: &TransactionId,
        gateway_ref: &str,
    ) -> Result<Receipt> {
        let account_id = &actor.account_id;

        if let Some(existing) = self.ledger.find_by_reference(account_id, gateway_ref).await? {
            info!(
                account = %account_id,
                reference = gateway_ref,
                "gateway reference already settled, replaying receipt"
            );
            return Ok(Receipt {
                transaction_id: existing.id,
                new_balance: existing.balance_after,
            });
        }

        let pending = self
            .ledger
            .transaction(account_id, transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })?;

        let redemption = match pending.coupon_code.as_deref() {
            Some(code) => {
                let order_id = OrderId::from_string(transaction_id.to_string());
                Some(
                    self.coupons
                        .redeem(code, account_id, &order_id, pending.amount)
                        .await?,
                )
            }
            None => None,
        };

        let receipt = match self
            .ledger
            .settle_topup(
                account_id,
                transaction_id,
                SettleOutcome::Completed,
                Some(gateway_ref.to_string()),
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(error) => {
                if let Some(redemption) = &redemption {
                    self.compensate_redemption(redemption).await;
                }
                return Err(error.into());
            }
        };

        info!(
            account = %account_id,
            transaction = %transaction_id,
            reference = gateway_ref,
            new_balance = %receipt.new_balance,
            "top-up confirmed"
        );
        if let Some(redemption) = &redemption {
            self.emit_redeemed(redemption);
        }
        self.emit(WalletEvent::TopupCompleted {
            account_id: account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            amount: pending.amount,
            new_balance: receipt.new_balance,
            timestamp: self.clock.now(),
        });
        Ok(receipt)
    }

    /// Record that the gateway payment for a pending top-up failed
    pub async fn fail_topup(
        &self,
        actor: &Actor,
        transaction_id: &TransactionId,
    ) -> Result<Receipt> {
        let receipt = self
            .ledger
            .settle_topup(
                &actor.account_id,
                transaction_id,
                SettleOutcome::Failed,
                None,
            )
            .await?;
        info!(
            account = %actor.account_id,
            transaction = %transaction_id,
            "top-up marked failed"
        );
        Ok(receipt)
    }

    async fn compensate_redemption(&self, redemption: &Redemption) {
        if let Err(error) = self
            .coupons
            .release(
                &redemption.code,
                &redemption.account_id,
                &redemption.order_id,
            )
            .await
        {
            warn!(
                code = %redemption.code,
                account = %redemption.account_id,
                order = %redemption.order_id,
                %error,
                "coupon release failed after ledger error, counters need reconciliation"
            );
        }
    }

    fn emit_redeemed(&self, redemption: &Redemption) {
        self.emit(WalletEvent::CouponRedeemed {
            account_id: redemption.account_id.clone(),
            code: redemption.code.clone(),
            order_id: redemption.order_id.clone(),
            discount: redemption.discount,
            timestamp: self.clock.now(),
        });
    }

    // ----- charges and adjustments -----

    /// Debit the actor's wallet, optionally admission-gated
    ///
    /// The gate is consulted before the debit; `LimitExceeded` and
    /// `InsufficientFunds` surface unchanged. A slot consumed for a charge
    /// that then fails on funds stays consumed.
    pub async fn charge(
        &self,
        actor: &Actor,
        kind: TxKind,
        amount: Decimal,
        description: impl Into<String>,
        gate: Option<&LimitKind>,
    ) -> Result<ChargeReceipt> {
        let admission = match gate {
            Some(limit_kind) => Some(self.limiter.check_and_consume(actor, limit_kind).await?),
            None => None,
        };

        let receipt = self
            .ledger
            .debit(&actor.account_id, amount, kind, description)
            .await?;

        self.emit(WalletEvent::WalletCharged {
            account_id: actor.account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            kind,
            amount,
            new_balance: receipt.new_balance,
            timestamp: self.clock.now(),
        });
        Ok(ChargeReceipt { receipt, admission })
    }

    /// Credit back a previous charge
    pub async fn refund(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Receipt> {
        let receipt = self
            .ledger
            .credit(account_id, amount, TxKind::Refund, description, None)
            .await?;
        self.emit(WalletEvent::RefundIssued {
            account_id: account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            amount,
            new_balance: receipt.new_balance,
            timestamp: self.clock.now(),
        });
        Ok(receipt)
    }

    /// Credit a promotional bonus; administrators only
    pub async fn grant_bonus(
        &self,
        actor: &Actor,
        account_id: &AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Receipt> {
        self.require_admin(actor, "grant_bonus")?;
        let receipt = self
            .ledger
            .credit(account_id, amount, TxKind::Bonus, description, None)
            .await?;
        self.emit(WalletEvent::BonusGranted {
            account_id: account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            amount,
            timestamp: self.clock.now(),
        });
        Ok(receipt)
    }

    /// Pay balance out of the platform
    pub async fn withdraw(
        &self,
        actor: &Actor,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Receipt> {
        let receipt = self
            .ledger
            .debit(&actor.account_id, amount, TxKind::Withdrawal, description)
            .await?;
        self.emit(WalletEvent::WithdrawalRequested {
            account_id: actor.account_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            amount,
            timestamp: self.clock.now(),
        });
        Ok(receipt)
    }

    // ----- coupon administration -----

    pub async fn create_coupon(&self, actor: &Actor, definition: NewCoupon) -> Result<Coupon> {
        self.require_admin(actor, "create_coupon")?;
        Ok(self.coupons.create(definition).await?)
    }

    pub async fn deactivate_coupon(&self, actor: &Actor, code: &str) -> Result<Coupon> {
        self.require_admin(actor, "deactivate_coupon")?;
        Ok(self.coupons.deactivate(code).await?)
    }

    pub async fn list_coupons(&self, actor: &Actor) -> Result<Vec<Coupon>> {
        self.require_admin(actor, "list_coupons")?;
        Ok(self.coupons.list().await?)
    }

    // ----- limiter administration -----

    pub async fn configure_limit(
        &self,
        actor: &Actor,
        kind: &LimitKind,
        max: u32,
    ) -> Result<DailyQuotas> {
        self.require_admin(actor, "configure_limit")?;
        Ok(self.limiter.configure(kind, max).await?)
    }

    pub async fn remove_limit(&self, actor: &Actor, kind: &LimitKind) -> Result<()> {
        self.require_admin(actor, "remove_limit")?;
        Ok(self.limiter.remove(kind).await?)
    }

    /// Today's quota counters as the next request would see them
    pub async fn limiter_status(&self) -> Result<DailyQuotas> {
        Ok(self.limiter.status().await?)
    }
}

fn mint_order_id() -> OrderId {
    OrderId::from_string(format!("ord_{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mentora_coupons::{CouponRejection, Discount};
    use mentora_types::{Clock, ManualClock};
    use rust_decimal_macros::dec;

    fn test_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at(
            chrono::Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
        ))
    }

    async fn test_service() -> (BillingService, Arc<ManualClock>) {
        let clock = test_clock();
        let config = BillingConfig {
            daily_limits: vec![(LimitKind::mock_interview(), 2)],
            ..BillingConfig::default()
        };
        let service = BillingService::in_memory(config, clock.clone())
            .await
            .unwrap();
        (service, clock)
    }

    fn save10(clock: &ManualClock) -> NewCoupon {
        NewCoupon {
            code: "SAVE10".to_string(),
            description: "10% off".to_string(),
            discount: Discount::Percentage(dec!(10)),
            max_discount: Some(dec!(50)),
            min_purchase: dec!(100),
            usage_limit: None,
            per_user_limit: 1,
            valid_from: clock.now() - chrono::Duration::days(1),
            valid_to: clock.now() + chrono::Duration::days(30),
        }
    }

    fn free100(clock: &ManualClock) -> NewCoupon {
        NewCoupon {
            code: "FREE100".to_string(),
            description: "First top-up free".to_string(),
            discount: Discount::Percentage(dec!(100)),
            max_discount: None,
            min_purchase: Decimal::ZERO,
            usage_limit: Some(10),
            per_user_limit: 1,
            valid_from: clock.now() - chrono::Duration::days(1),
            valid_to: clock.now() + chrono::Duration::days(30),
        }
    }

    fn admin() -> Actor {
        Actor::admin("admin-1")
    }

    fn user() -> Actor {
        Actor::user("user-1")
    }

    #[tokio::test]
    async fn test_discounted_topup_roundtrip() {
        let (service, clock) = test_service().await;
        let user = user();
        service.create_coupon(&admin(), save10(&clock)).await.unwrap();

        let intent = service
            .begin_topup(&user, dec!(500), Some("SAVE10"))
            .await
            .unwrap();
        let (transaction_id, payable) = match intent {
            TopupIntent::AwaitingPayment {
                transaction_id,
                payable,
                discount,
                amount,
            } => {
                assert_eq!(amount, dec!(500));
                assert_eq!(discount, dec!(50));
                (transaction_id, payable)
            }
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };
        assert_eq!(payable, dec!(450));
        // Nothing credited while the gateway has the payment
        assert_eq!(service.balance(&user.account_id).await.unwrap(), Decimal::ZERO);

        let receipt = service
            .confirm_topup(&user, &transaction_id, "pay_001")
            .await
            .unwrap();
        // The wallet receives the full pack amount, not the payable
        assert_eq!(receipt.new_balance, dec!(500));

        let coupon = service
            .list_coupons(&admin())
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.code == "SAVE10")
            .unwrap();
        assert_eq!(coupon.used_count, 1);
        assert_eq!(coupon.used_by[0].order_id.as_str(), transaction_id.to_string());
    }

    #[tokio::test]
    async fn test_pending_topup_carries_the_quoted_coupon() {
        let (service, clock) = test_service().await;
        let user = user();
        service.create_coupon(&admin(), save10(&clock)).await.unwrap();

        // Quoted lowercase; the pending record carries the normalized code
        let intent = service
            .begin_topup(&user, dec!(500), Some("save10"))
            .await
            .unwrap();
        let TopupIntent::AwaitingPayment { transaction_id, .. } = intent else {
            panic!("expected AwaitingPayment");
        };

        let history = service
            .transactions(&user.account_id, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(history.items[0].coupon_code.as_deref(), Some("SAVE10"));

        // Confirmation redeems what was quoted without restating the code
        service
            .confirm_topup(&user, &transaction_id, "pay_locked")
            .await
            .unwrap();
        let coupon = service
            .list_coupons(&admin())
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.code == "SAVE10")
            .unwrap();
        assert_eq!(coupon.used_count, 1);
        assert_eq!(coupon.used_by[0].account_id, user.account_id);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent_on_gateway_ref() {
        let (service, _clock) = test_service().await;
        let user = user();

        let intent = service.begin_topup(&user, dec!(200), None).await.unwrap();
        let TopupIntent::AwaitingPayment { transaction_id, .. } = intent else {
            panic!("expected AwaitingPayment");
        };

        let first = service
            .confirm_topup(&user, &transaction_id, "pay_dup")
            .await
            .unwrap();
        let replay = service
            .confirm_topup(&user, &transaction_id, "pay_dup")
            .await
            .unwrap();

        assert_eq!(first.transaction_id, replay.transaction_id);
        assert_eq!(first.new_balance, replay.new_balance);
        assert_eq!(service.balance(&user.account_id).await.unwrap(), dec!(200));

        let history = service
            .transactions(&user.account_id, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(history.total, 1);
    }

    #[tokio::test]
    async fn test_full_discount_skips_gateway() {
        let (service, clock) = test_service().await;
        let user = user();
        service
            .create_coupon(&admin(), free100(&clock))
            .await
            .unwrap();

        let intent = service
            .begin_topup(&user, dec!(300), Some("FREE100"))
            .await
            .unwrap();
        match intent {
            TopupIntent::Credited {
                new_balance,
                discount,
                ..
            } => {
                assert_eq!(new_balance, dec!(300));
                assert_eq!(discount, dec!(300));
            }
            other => panic!("expected Credited, got {other:?}"),
        }

        // Credited immediately, no pending transaction left behind
        let history = service
            .transactions(&user.account_id, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(history.total, 1);
        assert!(history.items[0].status.is_applied());

        let coupon = service
            .list_coupons(&admin())
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.code == "FREE100")
            .unwrap();
        assert_eq!(coupon.used_count, 1);
    }

    #[tokio::test]
    async fn test_begin_topup_surfaces_coupon_rejection() {
        let (service, clock) = test_service().await;
        service.create_coupon(&admin(), save10(&clock)).await.unwrap();

        let result = service.begin_topup(&user(), dec!(50), Some("SAVE10")).await;
        assert!(matches!(
            result,
            Err(BillingError::Coupon(CouponError::Rejected {
                reason: CouponRejection::BelowMinPurchase,
                ..
            }))
        ));
        // Nothing was recorded
        let history = service
            .transactions(&user().account_id, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(history.total, 0);
    }

    #[tokio::test]
    async fn test_failed_topup_keeps_balance_untouched() {
        let (service, _clock) = test_service().await;
        let user = user();

        let intent = service.begin_topup(&user, dec!(400), None).await.unwrap();
        let TopupIntent::AwaitingPayment { transaction_id, .. } = intent else {
            panic!("expected AwaitingPayment");
        };

        service.fail_topup(&user, &transaction_id).await.unwrap();
        assert_eq!(service.balance(&user.account_id).await.unwrap(), Decimal::ZERO);

        // A failed payment cannot be confirmed afterwards
        let result = service
            .confirm_topup(&user, &transaction_id, "pay_late")
            .await;
        assert!(matches!(
            result,
            Err(BillingError::Ledger(
                LedgerError::InvalidStatusTransition { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_gated_charges_exhaust_the_daily_limit() {
        let (service, _clock) = test_service().await;
        let user = user();
        service.refund(&user.account_id, dec!(1000), "seed").await.unwrap();

        let gate = LimitKind::mock_interview();
        for _ in 0..2 {
            service
                .charge(
                    &user,
                    TxKind::InterviewCharge,
                    dec!(100),
                    "Mock interview",
                    Some(&gate),
                )
                .await
                .unwrap();
        }

        let result = service
            .charge(
                &user,
                TxKind::InterviewCharge,
                dec!(100),
                "Mock interview",
                Some(&gate),
            )
            .await;
        assert!(matches!(
            result,
            Err(BillingError::Limiter(
                mentora_limiter::LimiterError::LimitExceeded { max: 2, .. }
            ))
        ));
        // Only the two admitted charges were debited
        assert_eq!(service.balance(&user.account_id).await.unwrap(), dec!(800));
    }

    #[tokio::test]
    async fn test_admin_charge_bypasses_the_gate() {
        let (service, _clock) = test_service().await;
        let admin = admin();
        service
            .refund(&admin.account_id, dec!(1000), "seed")
            .await
            .unwrap();

        let gate = LimitKind::mock_interview();
        for _ in 0..5 {
            let charged = service
                .charge(
                    &admin,
                    TxKind::InterviewCharge,
                    dec!(10),
                    "Mock interview",
                    Some(&gate),
                )
                .await
                .unwrap();
            assert_eq!(charged.admission, Some(Admission::Bypassed));
        }
    }

    #[tokio::test]
    async fn test_insufficient_funds_surfaces_with_detail() {
        let (service, _clock) = test_service().await;
        let user = user();
        service.refund(&user.account_id, dec!(30), "seed").await.unwrap();

        let result = service
            .charge(&user, TxKind::CallCharge, dec!(100), "Mentor call", None)
            .await;
        assert!(matches!(
            result,
            Err(BillingError::Ledger(LedgerError::InsufficientFunds {
                available,
                requested,
            })) if available == dec!(30) && requested == dec!(100)
        ));
    }

    #[tokio::test]
    async fn test_admin_only_operations() {
        let (service, clock) = test_service().await;
        let user = user();

        let result = service.create_coupon(&user, save10(&clock)).await;
        assert!(matches!(result, Err(BillingError::AdminRequired { .. })));

        let result = service
            .grant_bonus(&user, &user.account_id, dec!(100), "self-serve")
            .await;
        assert!(matches!(result, Err(BillingError::AdminRequired { .. })));

        let result = service
            .configure_limit(&user, &LimitKind::quiz(), 5)
            .await;
        assert!(matches!(result, Err(BillingError::AdminRequired { .. })));

        service
            .grant_bonus(&admin(), &user.account_id, dec!(100), "welcome")
            .await
            .unwrap();
        assert_eq!(service.balance(&user.account_id).await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_withdraw_debits_and_emits() {
        let (service, _clock) = test_service().await;
        let user = user();
        service.refund(&user.account_id, dec!(500), "seed").await.unwrap();

        let mut events = service.subscribe();
        service.withdraw(&user, dec!(200), "Payout").await.unwrap();
        assert_eq!(service.balance(&user.account_id).await.unwrap(), dec!(300));

        let event = events.try_recv().unwrap();
        assert!(matches!(
            event,
            WalletEvent::WithdrawalRequested { amount, .. } if amount == dec!(200)
        ));
    }

    #[tokio::test]
    async fn test_topup_emits_completed_event() {
        let (service, _clock) = test_service().await;
        let user = user();
        let mut events = service.subscribe();

        let intent = service.begin_topup(&user, dec!(250), None).await.unwrap();
        let TopupIntent::AwaitingPayment { transaction_id, .. } = intent else {
            panic!("expected AwaitingPayment");
        };
        service
            .confirm_topup(&user, &transaction_id, "pay_evt")
            .await
            .unwrap();

        let event = events.try_recv().unwrap();
        assert!(matches!(
            event,
            WalletEvent::TopupCompleted { amount, new_balance, .. }
                if amount == dec!(250) && new_balance == dec!(250)
        ));
    }

    #[tokio::test]
    async fn test_confirm_unknown_transaction() {
        let (service, _clock) = test_service().await;
        let result = service
            .confirm_topup(&user(), &TransactionId::new(), "pay_x")
            .await;
        assert!(matches!(
            result,
            Err(BillingError::Ledger(LedgerError::TransactionNotFound { .. }))
        ));
    }
}
