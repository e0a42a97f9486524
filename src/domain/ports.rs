use super::commission::CommissionTransaction;
use super::coupon::{Coupon, CouponApplication};
use super::identity::Identity;
use super::order::Order;
use super::payout::{CommissionPayout, Period, PayoutStatus};
use super::stock::{Product, StockMovement};
use super::store::{Store, StoreStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Inserts a coupon; returns `false` when the code is already taken.
    async fn insert(&self, coupon: Coupon) -> Result<bool>;
    async fn get(&self, id: Uuid) -> Result<Option<Coupon>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>>;
    /// All coupons, oldest first.
    async fn list(&self) -> Result<Vec<Coupon>>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool>;
    /// Takes one use of the coupon; returns `false` when its usage limit is exhausted.
    async fn increment_usage(&self, id: Uuid) -> Result<bool>;
    async fn decrement_usage(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait CouponApplicationStore: Send + Sync {
    /// Inserts unless the order already carries an application.
    async fn insert_if_absent(&self, application: CouponApplication) -> Result<bool>;
    async fn get_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>>;
    async fn remove_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>>;
    async fn count_for_user(&self, user_id: &str, coupon_id: Uuid) -> Result<usize>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, order_id: &str) -> Result<Option<Order>>;
    /// Orders of `user_id` that count as purchases (neither pending nor cancelled).
    async fn count_purchases(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait StoreRegistry: Send + Sync {
    /// Inserts a store; returns `false` when the id is already registered.
    async fn insert(&self, store: Store) -> Result<bool>;
    async fn get(&self, store_id: &str) -> Result<Option<Store>>;
    async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>>;
    /// Replaces the store only if its current status is still `expected`.
    async fn compare_and_swap(&self, expected: StoreStatus, store: Store) -> Result<bool>;
    async fn update(&self, store: Store) -> Result<()>;
}

#[async_trait]
pub trait CommissionStore: Send + Sync {
    /// Inserts unless a row for the same `(order_id, order_item_id)` exists.
    async fn insert_if_absent(&self, tx: CommissionTransaction) -> Result<bool>;
    async fn for_order(&self, order_id: &str) -> Result<Vec<CommissionTransaction>>;
    /// Transactions of `store_id` with `from <= created_at < to`.
    async fn for_store(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionTransaction>>;
}

#[derive(Debug, Default, Clone)]
pub struct PayoutFilter {
    pub store_id: Option<String>,
    pub status: Option<PayoutStatus>,
    pub period: Option<Period>,
}

impl PayoutFilter {
    pub fn matches(&self, payout: &CommissionPayout) -> bool {
        self.store_id.as_ref().is_none_or(|s| *s == payout.store_id)
            && self.status.is_none_or(|s| s == payout.status)
            && self.period.is_none_or(|p| p == payout.period)
    }
}

#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Inserts unless a payout for the same `(store_id, period)` exists.
    async fn insert_unique(&self, payout: CommissionPayout) -> Result<bool>;
    async fn get(&self, id: Uuid) -> Result<Option<CommissionPayout>>;
    async fn list(&self, filter: &PayoutFilter) -> Result<Vec<CommissionPayout>>;
    /// Replaces the payout only if its current status is still `expected`.
    async fn compare_and_swap(
        &self,
        expected: PayoutStatus,
        payout: CommissionPayout,
    ) -> Result<bool>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> Result<bool>;
    async fn get_product(&self, product_id: &str) -> Result<Option<Product>>;
    /// Sets the stock only if it still equals `expected`.
    async fn set_stock(&self, product_id: &str, expected: i64, new_stock: i64) -> Result<bool>;
    async fn append_movement(&self, movement: StockMovement) -> Result<()>;
    /// Movements of a product, oldest first.
    async fn movements(&self, product_id: &str) -> Result<Vec<StockMovement>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;
}

/// Every storage backend the services need, shared behind `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub coupons: Arc<dyn CouponStore>,
    pub applications: Arc<dyn CouponApplicationStore>,
    pub orders: Arc<dyn OrderStore>,
    pub stores: Arc<dyn StoreRegistry>,
    pub commissions: Arc<dyn CommissionStore>,
    pub payouts: Arc<dyn PayoutStore>,
    pub inventory: Arc<dyn InventoryStore>,
}
