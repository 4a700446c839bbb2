//! Coupon definitions, validation rules, and discount math

use chrono::{DateTime, Utc};
use mentora_types::{AccountId, CouponId, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CouponError, Result};

/// How a coupon reduces the purchase amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent of the purchase amount, in `(0, 100]`
    Percentage(Decimal),
    /// Flat amount off, independent of the purchase amount
    Fixed(Decimal),
}

/// Why a coupon cannot be applied
///
/// Surfaced verbatim to the caller so the UI can render an actionable
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    Inactive,
    Expired,
    UsageLimitReached,
    BelowMinPurchase,
    PerUserLimitReached,
}

impl CouponRejection {
    /// Stable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Inactive => "COUPON_INACTIVE",
            Self::Expired => "COUPON_EXPIRED",
            Self::UsageLimitReached => "COUPON_USAGE_LIMIT_REACHED",
            Self::BelowMinPurchase => "COUPON_BELOW_MIN_PURCHASE",
            Self::PerUserLimitReached => "COUPON_PER_USER_LIMIT_REACHED",
        }
    }
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::Inactive => "coupon is not active",
            Self::Expired => "coupon is outside its validity window",
            Self::UsageLimitReached => "coupon has reached its usage limit",
            Self::BelowMinPurchase => "purchase amount is below the coupon minimum",
            Self::PerUserLimitReached => "account has already used this coupon the maximum number of times",
        };
        write!(f, "{message}")
    }
}

/// One committed redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponUsage {
    pub account_id: AccountId,
    pub used_at: DateTime<Utc>,
    pub order_id: OrderId,
}

/// A stored coupon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Uppercase; the unique lookup key
    pub code: String,
    pub description: String,
    pub discount: Discount,
    /// Cap on a percentage discount; ignored for fixed discounts
    pub max_discount: Option<Decimal>,
    /// Smallest purchase amount the coupon applies to
    pub min_purchase: Decimal,
    /// Total redemptions allowed across all accounts; `None` = unlimited
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    /// Redemptions allowed per account
    pub per_user_limit: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: bool,
    pub used_by: Vec<CouponUsage>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Canonical form of a user-supplied code
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// How many times this account has redeemed the coupon
    pub fn usage_count_for(&self, account_id: &AccountId) -> u32 {
        self.used_by
            .iter()
            .filter(|u| &u.account_id == account_id)
            .count() as u32
    }

    /// Check whether the coupon can be applied to this purchase now
    ///
    /// Pure; checks run in a fixed order so the caller always sees the same
    /// reason for the same state: active, window, global cap, minimum
    /// purchase, per-account cap.
    pub fn validate(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if now < self.valid_from || now > self.valid_to {
            return Err(CouponRejection::Expired);
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(CouponRejection::UsageLimitReached);
            }
        }
        if amount < self.min_purchase {
            return Err(CouponRejection::BelowMinPurchase);
        }
        if self.usage_count_for(account_id) >= self.per_user_limit {
            return Err(CouponRejection::PerUserLimitReached);
        }
        Ok(())
    }

    /// Discount this coupon grants on `amount`
    ///
    /// Pure. The result always lies in `[0, amount]`: a percentage is capped
    /// at `max_discount` when set, and a fixed value larger than the purchase
    /// is clamped down to it.
    pub fn calculate_discount(&self, amount: Decimal) -> Decimal {
        if amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let raw = match self.discount {
            Discount::Percentage(percent) => {
                let discount = amount * percent / Decimal::ONE_HUNDRED;
                match self.max_discount {
                    Some(cap) => discount.min(cap),
                    None => discount,
                }
            }
            Discount::Fixed(value) => value,
        };
        raw.clamp(Decimal::ZERO, amount)
    }
}

/// Construction input for a coupon, validated before anything is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub description: String,
    pub discount: Discount,
    pub max_discount: Option<Decimal>,
    pub min_purchase: Decimal,
    pub usage_limit: Option<u32>,
    pub per_user_limit: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl NewCoupon {
    /// Validate the definition and build the stored form
    pub fn into_coupon(self, now: DateTime<Utc>) -> Result<Coupon> {
        let code = Coupon::normalize_code(&self.code);
        if code.is_empty() {
            return Err(CouponError::invalid_definition("Code must not be empty"));
        }
        if code.contains(char::is_whitespace) {
            return Err(CouponError::invalid_definition(
                "Code must not contain whitespace",
            ));
        }
        match self.discount {
            Discount::Percentage(percent) => {
                if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                    return Err(CouponError::invalid_definition(
                        "Percentage must be in (0, 100]",
                    ));
                }
            }
            Discount::Fixed(value) => {
                if value <= Decimal::ZERO {
                    return Err(CouponError::invalid_definition(
                        "Fixed discount must be greater than zero",
                    ));
                }
            }
        }
        if let Some(cap) = self.max_discount {
            if cap <= Decimal::ZERO {
                return Err(CouponError::invalid_definition(
                    "Discount cap must be greater than zero",
                ));
            }
        }
        if self.min_purchase < Decimal::ZERO {
            return Err(CouponError::invalid_definition(
                "Minimum purchase must not be negative",
            ));
        }
        if self.usage_limit == Some(0) {
            return Err(CouponError::invalid_definition(
                "Usage limit of zero would make the coupon unusable",
            ));
        }
        if self.per_user_limit == 0 {
            return Err(CouponError::invalid_definition(
                "Per-user limit must be at least one",
            ));
        }
        if self.valid_from >= self.valid_to {
            return Err(CouponError::invalid_definition(
                "Validity window must start before it ends",
            ));
        }

        Ok(Coupon {
            id: CouponId::new(),
            code,
            description: self.description,
            discount: self.discount,
            max_discount: self.max_discount,
            min_purchase: self.min_purchase,
            usage_limit: self.usage_limit,
            used_count: 0,
            per_user_limit: self.per_user_limit,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            is_active: true,
            used_by: Vec::new(),
            created_at: now,
        })
    }
}

/// Pricing answer for a (code, account, amount) triple
///
/// The boundary shape handed to the caller: either the discount to apply, or
/// the specific reason the coupon cannot be used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub valid: bool,
    pub reason: Option<CouponRejection>,
    pub discount: Decimal,
    pub final_amount: Decimal,
}

impl Quote {
    pub fn valid(code: String, amount: Decimal, discount: Decimal) -> Self {
        Self {
            code,
            valid: true,
            reason: None,
            discount,
            final_amount: amount - discount,
        }
    }

    pub fn rejected(code: String, amount: Decimal, reason: CouponRejection) -> Self {
        Self {
            code,
            valid: false,
            reason: Some(reason),
            discount: Decimal::ZERO,
            final_amount: amount,
        }
    }

    /// True when the discount covers the whole purchase
    pub fn is_free(&self) -> bool {
        self.valid && self.final_amount <= Decimal::ZERO
    }
}
