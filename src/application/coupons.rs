use crate::domain::cart::CartContext;
use crate::domain::coupon::{
    Coupon, CouponApplication, CouponRejection, Discount, Eligibility, NewCoupon,
};
use crate::domain::money::Money;
use crate::domain::ports::{CouponApplicationStore, CouponStore, OrderStore, Repositories};
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The client-facing view of a coupon.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct CouponSummary {
    pub id: Uuid,
    pub code: String,
    pub discount: Discount,
    pub minimum_order_value: Option<Money>,
    pub maximum_discount: Option<Money>,
    pub expires_at: Option<DateTime<Utc>>,
    pub auto_apply: bool,
}

impl From<&Coupon> for CouponSummary {
    fn from(coupon: &Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code.clone(),
            discount: coupon.discount,
            minimum_order_value: coupon.minimum_order_value,
            maximum_discount: coupon.maximum_discount,
            expires_at: coupon.expires_at,
            auto_apply: coupon.is_auto_apply(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct EvaluatedCoupon {
    pub coupon: CouponSummary,
    pub estimated_savings: Money,
}

/// Coupons valid for a cart, each list sorted by descending savings.
#[derive(Debug, Serialize, Default, PartialEq)]
pub struct Evaluation {
    pub auto_apply: Vec<EvaluatedCoupon>,
    pub general: Vec<EvaluatedCoupon>,
}

impl Evaluation {
    /// Highest-saving auto-apply candidate; on ties the first one listed wins.
    pub fn best_auto_apply(&self) -> Option<&EvaluatedCoupon> {
        self.auto_apply.first()
    }

    pub fn is_empty(&self) -> bool {
        self.auto_apply.is_empty() && self.general.is_empty()
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct AppliedCoupon {
    pub application: CouponApplication,
    pub discount: Money,
    pub new_total: Money,
}

/// Coupon evaluation and application against the order history.
pub struct CouponService {
    coupons: Arc<dyn CouponStore>,
    applications: Arc<dyn CouponApplicationStore>,
    orders: Arc<dyn OrderStore>,
}

impl CouponService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            coupons: repos.coupons.clone(),
            applications: repos.applications.clone(),
            orders: repos.orders.clone(),
        }
    }

    pub async fn create_coupon(&self, new_coupon: NewCoupon) -> Result<Coupon> {
        let coupon = new_coupon.into_coupon(Utc::now())?;
        if !self.coupons.insert(coupon.clone()).await? {
            return Err(MarketError::Conflict(format!(
                "Coupon code {} already exists",
                coupon.code
            )));
        }
        info!(target: "audit", code = %coupon.code, id = %coupon.id, "Coupon created");
        Ok(coupon)
    }

    pub async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        self.coupons.list().await
    }

    pub async fn deactivate(&self, coupon_id: Uuid) -> Result<()> {
        if !self.coupons.set_active(coupon_id, false).await? {
            return Err(MarketError::NotFound(format!("Coupon {}", coupon_id)));
        }
        info!(target: "audit", id = %coupon_id, "Coupon deactivated");
        Ok(())
    }

    async fn eligibility(
        &self,
        user_id: &str,
        coupon: &Coupon,
        prior_purchases: usize,
        now: DateTime<Utc>,
    ) -> Result<Eligibility> {
        let user_uses = if coupon.single_use {
            self.applications.count_for_user(user_id, coupon.id).await?
        } else {
            0
        };
        Ok(Eligibility {
            now,
            prior_purchases,
            user_uses,
        })
    }

    pub async fn evaluate(&self, user_id: &str, ctx: &CartContext) -> Result<Evaluation> {
        self.evaluate_at(user_id, ctx, Utc::now()).await
    }

    /// Lists every coupon valid for `ctx` with its estimated savings.
    pub async fn evaluate_at(
        &self,
        user_id: &str,
        ctx: &CartContext,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        let mut evaluation = Evaluation::default();
        if !ctx.cart_total.is_positive() {
            return Ok(evaluation);
        }

        let prior_purchases = self.orders.count_purchases(user_id).await?;
        for coupon in self.coupons.list().await? {
            let eligibility = self
                .eligibility(user_id, &coupon, prior_purchases, now)
                .await?;
            match coupon.check(ctx, &eligibility) {
                Ok(estimated_savings) => {
                    let entry = EvaluatedCoupon {
                        coupon: CouponSummary::from(&coupon),
                        estimated_savings,
                    };
                    if coupon.is_auto_apply() {
                        evaluation.auto_apply.push(entry);
                    } else {
                        evaluation.general.push(entry);
                    }
                }
                Err(reason) => debug!(code = %coupon.code, %reason, "Coupon filtered out"),
            }
        }

        // Stable sorts: equal savings keep listing order.
        evaluation
            .auto_apply
            .sort_by(|a, b| b.estimated_savings.cmp(&a.estimated_savings));
        evaluation
            .general
            .sort_by(|a, b| b.estimated_savings.cmp(&a.estimated_savings));
        Ok(evaluation)
    }

    async fn validated(
        &self,
        user_id: &str,
        code: &str,
        ctx: &CartContext,
        now: DateTime<Utc>,
    ) -> Result<(Coupon, Money)> {
        if !ctx.cart_total.is_positive() {
            return Err(MarketError::Validation(
                "Cart total must be positive".to_string(),
            ));
        }
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or(MarketError::CouponInvalid(CouponRejection::NotFound))?;
        let prior_purchases = if coupon.requires_first_purchase() {
            self.orders.count_purchases(user_id).await?
        } else {
            0
        };
        let eligibility = self
            .eligibility(user_id, &coupon, prior_purchases, now)
            .await?;
        let savings = coupon
            .check(ctx, &eligibility)
            .map_err(MarketError::CouponInvalid)?;
        Ok((coupon, savings))
    }

    /// Checks a single code without recording anything.
    pub async fn validate(
        &self,
        user_id: &str,
        code: &str,
        ctx: &CartContext,
    ) -> Result<EvaluatedCoupon> {
        let (coupon, estimated_savings) = self.validated(user_id, code, ctx, Utc::now()).await?;
        Ok(EvaluatedCoupon {
            coupon: CouponSummary::from(&coupon),
            estimated_savings,
        })
    }

    pub async fn apply_coupon(
        &self,
        user_id: &str,
        code: &str,
        ctx: &CartContext,
        order_id: &str,
    ) -> Result<AppliedCoupon> {
        self.apply_coupon_at(user_id, code, ctx, order_id, Utc::now())
            .await
    }

    /// Validates `code`, binds it to `order_id` and takes one use of the coupon.
    pub async fn apply_coupon_at(
        &self,
        user_id: &str,
        code: &str,
        ctx: &CartContext,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(MarketError::Validation("order_id is required".to_string()));
        }
        if let Some(existing) = self.applications.get_for_order(order_id).await? {
            return Err(MarketError::Conflict(format!(
                "Order {} already has coupon {} applied; remove it first",
                order_id, existing.code
            )));
        }

        let order = self.orders.get(order_id).await?;
        if let Some(order) = &order
            && order.user_id != user_id
        {
            return Err(MarketError::Permission(format!(
                "Order {} belongs to another user",
                order_id
            )));
        }

        // A stored order is priced from its own lines; the client's cart only
        // stands in when the order does not exist yet.
        let priced = order.as_ref().map(CartContext::from);
        let ctx = priced.as_ref().unwrap_or(ctx);
        let (coupon, discount) = self.validated(user_id, code, ctx, now).await?;

        let application = CouponApplication {
            id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            user_id: user_id.to_string(),
            coupon_id: coupon.id,
            code: coupon.code.clone(),
            discount_amount: discount,
            savings: discount,
            usage_id: Uuid::new_v4(),
            applied_at: now,
        };
        if !self
            .applications
            .insert_if_absent(application.clone())
            .await?
        {
            return Err(MarketError::Conflict(format!(
                "Order {} already has a coupon applied",
                order_id
            )));
        }

        if !self.coupons.increment_usage(coupon.id).await? {
            self.applications.remove_for_order(order_id).await?;
            warn!(code = %coupon.code, order_id, "Usage limit reached while applying, application rolled back");
            return Err(MarketError::CouponInvalid(
                CouponRejection::UsageLimitReached,
            ));
        }

        let new_total = match order {
            Some(mut order) => {
                order.set_discount(discount);
                order.updated_at = now;
                let total = order.total();
                self.orders.store(order).await?;
                total
            }
            None => ctx.cart_total - discount,
        };

        info!(code = %coupon.code, order_id, user_id, %discount, "Coupon applied");
        Ok(AppliedCoupon {
            application,
            discount,
            new_total,
        })
    }

    /// Applies the best auto-apply coupon, if any is valid for the cart.
    pub async fn apply_best_coupon(
        &self,
        user_id: &str,
        ctx: &CartContext,
        order_id: &str,
    ) -> Result<Option<AppliedCoupon>> {
        let now = Utc::now();
        let priced = self
            .orders
            .get(order_id.trim())
            .await?
            .map(|order| CartContext::from(&order));
        let ctx = priced.as_ref().unwrap_or(ctx);
        let evaluation = self.evaluate_at(user_id, ctx, now).await?;
        let Some(best) = evaluation.best_auto_apply() else {
            debug!(order_id, user_id, "No auto-apply coupon for cart");
            return Ok(None);
        };
        let applied = self
            .apply_coupon_at(user_id, &best.coupon.code, ctx, order_id, now)
            .await?;
        Ok(Some(applied))
    }

    pub async fn application_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>> {
        self.applications.get_for_order(order_id).await
    }

    /// Detaches the coupon from `order_id` and releases its use.
    pub async fn remove_coupon(&self, order_id: &str) -> Result<CouponApplication> {
        let application = self
            .applications
            .remove_for_order(order_id)
            .await?
            .ok_or_else(|| {
                MarketError::NotFound(format!("No coupon applied to order {}", order_id))
            })?;
        self.coupons.decrement_usage(application.coupon_id).await?;

        if let Some(mut order) = self.orders.get(order_id).await? {
            order.set_discount(Money::ZERO);
            order.updated_at = Utc::now();
            self.orders.store(order).await?;
        }

        info!(code = %application.code, order_id, "Coupon removed");
        Ok(application)
    }
}
