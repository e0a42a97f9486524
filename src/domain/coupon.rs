use super::cart::CartContext;
use super::money::Money;
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    /// `value` percent of the cart total, `0 < value <= 100`.
    Percentage { value: Decimal },
    FixedAmount { value: Money },
}

/// Conditions under which the system may pick a coupon on the shopper's behalf.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub struct AutoApply {
    #[serde(default)]
    pub first_purchase: bool,
    #[serde(default)]
    pub category: bool,
}

impl AutoApply {
    pub fn enabled(&self) -> bool {
        self.first_purchase || self.category
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount: Discount,
    pub minimum_order_value: Option<Money>,
    pub maximum_discount: Option<Money>,
    pub store_id: Option<String>,
    pub category_id: Option<String>,
    pub auto_apply: AutoApply,
    pub first_purchase_only: bool,
    pub single_use: bool,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Why a coupon cannot be used for a given cart.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Inactive,
    NotStarted,
    Expired,
    UsageLimitReached,
    MinimumNotMet { minimum: Money },
    StoreMismatch,
    CategoryMismatch,
    FirstPurchaseOnly,
    AlreadyUsed,
    NoDiscount,
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "coupon not found"),
            Self::Inactive => write!(f, "coupon is not active"),
            Self::NotStarted => write!(f, "coupon is not valid yet"),
            Self::Expired => write!(f, "coupon has expired"),
            Self::UsageLimitReached => write!(f, "coupon usage limit reached"),
            Self::MinimumNotMet { minimum } => {
                write!(f, "minimum order value of {} not met", minimum)
            }
            Self::StoreMismatch => write!(f, "coupon does not apply to this store"),
            Self::CategoryMismatch => write!(f, "coupon does not apply to this category"),
            Self::FirstPurchaseOnly => write!(f, "coupon is only valid on a first purchase"),
            Self::AlreadyUsed => write!(f, "coupon already used"),
            Self::NoDiscount => write!(f, "coupon yields no discount for this cart"),
        }
    }
}

/// Per-user facts the coupon rules depend on, gathered from order history.
#[derive(Debug, Clone, Copy)]
pub struct Eligibility {
    pub now: DateTime<Utc>,
    pub prior_purchases: usize,
    pub user_uses: usize,
}

impl Coupon {
    pub fn requires_first_purchase(&self) -> bool {
        self.first_purchase_only || self.auto_apply.first_purchase
    }

    pub fn is_auto_apply(&self) -> bool {
        self.auto_apply.enabled()
    }

    /// Raw discount for `cart_total`, capped and never above the total itself.
    pub fn estimate_savings(&self, cart_total: Money) -> Money {
        if !cart_total.is_positive() {
            return Money::ZERO;
        }
        let raw = match self.discount {
            Discount::Percentage { value } => {
                let pct = cart_total * (value / HUNDRED);
                match self.maximum_discount {
                    Some(cap) => pct.min(cap),
                    None => pct,
                }
            }
            Discount::FixedAmount { value } => value.min(cart_total),
        };
        raw.min(cart_total)
    }

    /// Runs every eligibility rule and returns the discount the cart would get.
    pub fn check(
        &self,
        ctx: &CartContext,
        eligibility: &Eligibility,
    ) -> std::result::Result<Money, CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }
        if eligibility.now < self.starts_at {
            return Err(CouponRejection::NotStarted);
        }
        if let Some(expires_at) = self.expires_at
            && eligibility.now >= expires_at
        {
            return Err(CouponRejection::Expired);
        }
        if let Some(limit) = self.usage_limit
            && self.usage_count >= limit
        {
            return Err(CouponRejection::UsageLimitReached);
        }
        if let Some(minimum) = self.minimum_order_value
            && minimum > ctx.cart_total
        {
            return Err(CouponRejection::MinimumNotMet { minimum });
        }
        if let Some(store_id) = &self.store_id
            && !ctx.touches_store(store_id)
        {
            return Err(CouponRejection::StoreMismatch);
        }
        if let Some(category_id) = &self.category_id
            && !ctx.touches_category(category_id)
        {
            return Err(CouponRejection::CategoryMismatch);
        }
        if self.requires_first_purchase() && eligibility.prior_purchases > 0 {
            return Err(CouponRejection::FirstPurchaseOnly);
        }
        if self.single_use && eligibility.user_uses > 0 {
            return Err(CouponRejection::AlreadyUsed);
        }

        let savings = self.estimate_savings(ctx.cart_total);
        if savings.is_positive() {
            Ok(savings)
        } else {
            Err(CouponRejection::NoDiscount)
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Admin input for a new coupon.
#[derive(Debug, Deserialize, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub discount: Discount,
    #[serde(default)]
    pub minimum_order_value: Option<Money>,
    #[serde(default)]
    pub maximum_discount: Option<Money>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub auto_apply: AutoApply,
    #[serde(default)]
    pub first_purchase_only: bool,
    #[serde(default)]
    pub single_use: bool,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCoupon {
    pub fn into_coupon(self, now: DateTime<Utc>) -> Result<Coupon> {
        let code = normalize_code(&self.code);
        if code.is_empty() {
            return Err(MarketError::Validation("Coupon code is required".to_string()));
        }
        match self.discount {
            Discount::Percentage { value } if value <= Decimal::ZERO || value > HUNDRED => {
                return Err(MarketError::Validation(
                    "Percentage discount must be in (0, 100]".to_string(),
                ));
            }
            Discount::FixedAmount { value } if !value.is_positive() => {
                return Err(MarketError::Validation(
                    "Fixed discount must be positive".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(minimum) = self.minimum_order_value
            && minimum < Money::ZERO
        {
            return Err(MarketError::Validation(
                "Minimum order value cannot be negative".to_string(),
            ));
        }
        if let Some(cap) = self.maximum_discount
            && !cap.is_positive()
        {
            return Err(MarketError::Validation(
                "Maximum discount must be positive".to_string(),
            ));
        }
        if self.auto_apply.category && self.category_id.is_none() {
            return Err(MarketError::Validation(
                "Category auto-apply requires a category_id".to_string(),
            ));
        }
        let starts_at = self.starts_at.unwrap_or(now);
        if let Some(expires_at) = self.expires_at
            && expires_at <= starts_at
        {
            return Err(MarketError::Validation(
                "Coupon must expire after it starts".to_string(),
            ));
        }

        Ok(Coupon {
            id: Uuid::new_v4(),
            code,
            discount: self.discount,
            minimum_order_value: self.minimum_order_value,
            maximum_discount: self.maximum_discount,
            store_id: self.store_id,
            category_id: self.category_id,
            auto_apply: self.auto_apply,
            first_purchase_only: self.first_purchase_only,
            single_use: self.single_use,
            usage_limit: self.usage_limit,
            usage_count: 0,
            starts_at,
            expires_at: self.expires_at,
            active: true,
            created_at: now,
        })
    }
}

/// A coupon bound to one order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CouponApplication {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: String,
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_amount: Money,
    pub savings: Money,
    pub usage_id: Uuid,
    pub applied_at: DateTime<Utc>,
}
