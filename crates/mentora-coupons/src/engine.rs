//! Coupon engine
//!
//! Reads (`quote`, `find`, `list`) never mutate. Writes (`create`, `redeem`,
//! `release`, `deactivate`) serialize per coupon code, so two accounts racing
//! for the last redemption of a capped coupon cannot both win.

use std::sync::Arc;

use dashmap::DashMap;
use mentora_types::{AccountId, OrderId, SharedClock};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::coupon::{Coupon, CouponUsage, NewCoupon, Quote};
use crate::store::CouponStore;
use crate::{CouponError, Result};

/// Proof that one redemption was committed
///
/// Carries the discount numbers computed under the coupon's write lock, so
/// the caller charges exactly what was promised at commit time.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub code: String,
    pub account_id: AccountId,
    pub order_id: OrderId,
    pub discount: Decimal,
    pub final_amount: Decimal,
}

/// The Mentora coupon engine
#[derive(Clone)]
pub struct CouponEngine {
    store: Arc<dyn CouponStore>,
    clock: SharedClock,
    /// Per-code write locks; held across the load-mutate-save cycle
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CouponEngine {
    pub fn new(store: Arc<dyn CouponStore>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn code_lock(&self, code: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Store a new coupon; the code must not already exist
    pub async fn create(&self, definition: NewCoupon) -> Result<Coupon> {
        let coupon = definition.into_coupon(self.clock.now())?;

        let lock = self.code_lock(&coupon.code);
        let _guard = lock.lock().await;

        if self.store.load(&coupon.code).await?.is_some() {
            return Err(CouponError::DuplicateCode {
                code: coupon.code.clone(),
            });
        }
        self.store.save(&coupon).await?;
        Ok(coupon)
    }

    /// Look up a coupon by code, case-insensitively
    pub async fn find(&self, code: &str) -> Result<Option<Coupon>> {
        let code = Coupon::normalize_code(code);
        Ok(self.store.load(&code).await?)
    }

    /// All coupons, newest first
    pub async fn list(&self) -> Result<Vec<Coupon>> {
        let mut coupons = self.store.list().await?;
        coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(coupons)
    }

    /// Take a coupon out of circulation without touching its history
    pub async fn deactivate(&self, code: &str) -> Result<Coupon> {
        let code = Coupon::normalize_code(code);
        let lock = self.code_lock(&code);
        let _guard = lock.lock().await;

        let mut coupon = self
            .store
            .load(&code)
            .await?
            .ok_or(CouponError::NotFound { code })?;
        coupon.is_active = false;
        self.store.save(&coupon).await?;
        Ok(coupon)
    }

    /// Price a purchase against a coupon without committing anything
    ///
    /// An unknown code is an error; a known-but-unusable coupon is a rejected
    /// quote, so the caller can show the specific reason.
    pub async fn quote(
        &self,
        code: &str,
        account_id: &AccountId,
        amount: Decimal,
    ) -> Result<Quote> {
        let code = Coupon::normalize_code(code);
        let coupon = self
            .store
            .load(&code)
            .await?
            .ok_or(CouponError::NotFound { code })?;

        Ok(match coupon.validate(account_id, amount, self.clock.now()) {
            Ok(()) => {
                let discount = coupon.calculate_discount(amount);
                Quote::valid(coupon.code, amount, discount)
            }
            Err(reason) => Quote::rejected(coupon.code, amount, reason),
        })
    }

    /// Commit one redemption
    ///
    /// Re-validates under the coupon's write lock before writing; a quote
    /// that was valid a moment ago can still lose the last slot here. On
    /// success the usage record and counter land in one store write.
    pub async fn redeem(
        &self,
        code: &str,
        account_id: &AccountId,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<Redemption> {
        let code = Coupon::normalize_code(code);
        let lock = self.code_lock(&code);
        let _guard = lock.lock().await;

        let mut coupon = self
            .store
            .load(&code)
            .await?
            .ok_or(CouponError::NotFound { code: code.clone() })?;

        let now = self.clock.now();
        coupon
            .validate(account_id, amount, now)
            .map_err(|reason| CouponError::Rejected {
                code: code.clone(),
                reason,
            })?;

        let discount = coupon.calculate_discount(amount);
        coupon.used_count += 1;
        coupon.used_by.push(CouponUsage {
            account_id: account_id.clone(),
            used_at: now,
            order_id: order_id.clone(),
        });
        self.store.save(&coupon).await?;

        Ok(Redemption {
            code,
            account_id: account_id.clone(),
            order_id: order_id.clone(),
            discount,
            final_amount: amount - discount,
        })
    }

    /// Undo one committed redemption
    ///
    /// Compensating action for a unit of work whose other half failed.
    /// Removes exactly the usage record matching the account and order and
    /// decrements the counter.
    pub async fn release(
        &self,
        code: &str,
        account_id: &AccountId,
        order_id: &OrderId,
    ) -> Result<()> {
        let code = Coupon::normalize_code(code);
        let lock = self.code_lock(&code);
        let _guard = lock.lock().await;

        let mut coupon = self
            .store
            .load(&code)
            .await?
            .ok_or(CouponError::NotFound { code: code.clone() })?;

        let position = coupon
            .used_by
            .iter()
            .position(|u| &u.account_id == account_id && &u.order_id == order_id)
            .ok_or_else(|| CouponError::UsageNotFound {
                code: code.clone(),
                order_id: order_id.to_string(),
            })?;

        coupon.used_by.remove(position);
        coupon.used_count = coupon.used_count.saturating_sub(1);
        self.store.save(&coupon).await?;
        Ok(())
    }
}
