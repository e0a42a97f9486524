use crate::domain::commission::CommissionTransaction;
use crate::domain::coupon::{Coupon, CouponApplication, normalize_code};
use crate::domain::order::Order;
use crate::domain::payout::{CommissionPayout, PayoutStatus};
use crate::domain::ports::{
    CommissionStore, CouponApplicationStore, CouponStore, InventoryStore, OrderStore, PayoutFilter,
    PayoutStore, Repositories, StoreRegistry,
};
use crate::domain::stock::{Product, StockMovement};
use crate::domain::store::{Store, StoreStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Builds a full set of in-memory repositories.
///
/// Ideal for tests and for running the service without persistence.
pub fn repositories() -> Repositories {
    Repositories {
        coupons: Arc::new(InMemoryCouponStore::new()),
        applications: Arc::new(InMemoryCouponApplicationStore::new()),
        orders: Arc::new(InMemoryOrderStore::new()),
        stores: Arc::new(InMemoryStoreRegistry::new()),
        commissions: Arc::new(InMemoryCommissionStore::new()),
        payouts: Arc::new(InMemoryPayoutStore::new()),
        inventory: Arc::new(InMemoryInventoryStore::new()),
    }
}

/// Coupons kept in insertion order so listing is oldest first.
#[derive(Default, Clone)]
pub struct InMemoryCouponStore {
    coupons: Arc<RwLock<Vec<Coupon>>>,
}

impl InMemoryCouponStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn insert(&self, coupon: Coupon) -> Result<bool> {
        let mut coupons = self.coupons.write().await;
        if coupons.iter().any(|c| c.code == coupon.code) {
            return Ok(false);
        }
        coupons.push(coupon);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Coupon>> {
        let coupons = self.coupons.read().await;
        Ok(coupons.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let code = normalize_code(code);
        let coupons = self.coupons.read().await;
        Ok(coupons.iter().find(|c| c.code == code).cloned())
    }

    async fn list(&self) -> Result<Vec<Coupon>> {
        Ok(self.coupons.read().await.clone())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let mut coupons = self.coupons.write().await;
        match coupons.iter_mut().find(|c| c.id == id) {
            Some(coupon) => {
                coupon.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_usage(&self, id: Uuid) -> Result<bool> {
        let mut coupons = self.coupons.write().await;
        let Some(coupon) = coupons.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        if coupon.usage_limit.is_some_and(|limit| coupon.usage_count >= limit) {
            return Ok(false);
        }
        coupon.usage_count += 1;
        Ok(true)
    }

    async fn decrement_usage(&self, id: Uuid) -> Result<()> {
        let mut coupons = self.coupons.write().await;
        if let Some(coupon) = coupons.iter_mut().find(|c| c.id == id) {
            coupon.usage_count = coupon.usage_count.saturating_sub(1);
        }
        Ok(())
    }
}

/// Applications keyed by order id; the key doubles as the one-per-order constraint.
#[derive(Default, Clone)]
pub struct InMemoryCouponApplicationStore {
    applications: Arc<RwLock<HashMap<String, CouponApplication>>>,
}

impl InMemoryCouponApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponApplicationStore for InMemoryCouponApplicationStore {
    async fn insert_if_absent(&self, application: CouponApplication) -> Result<bool> {
        let mut applications = self.applications.write().await;
        if applications.contains_key(&application.order_id) {
            return Ok(false);
        }
        applications.insert(application.order_id.clone(), application);
        Ok(true)
    }

    async fn get_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>> {
        Ok(self.applications.read().await.get(order_id).cloned())
    }

    async fn remove_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>> {
        Ok(self.applications.write().await.remove(order_id))
    }

    async fn count_for_user(&self, user_id: &str, coupon_id: Uuid) -> Result<usize> {
        let applications = self.applications.read().await;
        Ok(applications
            .values()
            .filter(|a| a.user_id == user_id && a.coupon_id == coupon_id)
            .count())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<()> {
        self.orders.write().await.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn count_purchases(&self, user_id: &str) -> Result<usize> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.user_id == user_id && o.status.counts_as_purchase())
            .count())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryStoreRegistry {
    stores: Arc<RwLock<HashMap<String, Store>>>,
}

impl InMemoryStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreRegistry for InMemoryStoreRegistry {
    async fn insert(&self, store: Store) -> Result<bool> {
        let mut stores = self.stores.write().await;
        if stores.contains_key(&store.id) {
            return Ok(false);
        }
        stores.insert(store.id.clone(), store);
        Ok(true)
    }

    async fn get(&self, store_id: &str) -> Result<Option<Store>> {
        Ok(self.stores.read().await.get(store_id).cloned())
    }

    async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>> {
        let stores = self.stores.read().await;
        let mut result: Vec<Store> = stores
            .values()
            .filter(|s| status.is_none_or(|st| st == s.status))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn compare_and_swap(&self, expected: StoreStatus, store: Store) -> Result<bool> {
        let mut stores = self.stores.write().await;
        match stores.get_mut(&store.id) {
            Some(current) if current.status == expected => {
                *current = store;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update(&self, store: Store) -> Result<()> {
        self.stores.write().await.insert(store.id.clone(), store);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCommissionStore {
    transactions: Arc<RwLock<Vec<CommissionTransaction>>>,
}

impl InMemoryCommissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommissionStore for InMemoryCommissionStore {
    async fn insert_if_absent(&self, tx: CommissionTransaction) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        if transactions
            .iter()
            .any(|t| t.order_id == tx.order_id && t.order_item_id == tx.order_item_id)
        {
            return Ok(false);
        }
        transactions.push(tx);
        Ok(true)
    }

    async fn for_order(&self, order_id: &str) -> Result<Vec<CommissionTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn for_store(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|t| t.store_id == store_id && t.created_at >= from && t.created_at < to)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    payouts: Arc<RwLock<HashMap<Uuid, CommissionPayout>>>,
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn insert_unique(&self, payout: CommissionPayout) -> Result<bool> {
        let mut payouts = self.payouts.write().await;
        if payouts
            .values()
            .any(|p| p.store_id == payout.store_id && p.period == payout.period)
        {
            return Ok(false);
        }
        payouts.insert(payout.id, payout);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CommissionPayout>> {
        Ok(self.payouts.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &PayoutFilter) -> Result<Vec<CommissionPayout>> {
        let payouts = self.payouts.read().await;
        let mut result: Vec<CommissionPayout> = payouts
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn compare_and_swap(
        &self,
        expected: PayoutStatus,
        payout: CommissionPayout,
    ) -> Result<bool> {
        let mut payouts = self.payouts.write().await;
        match payouts.get_mut(&payout.id) {
            Some(current) if current.status == expected => {
                *current = payout;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryInventoryStore {
    products: Arc<RwLock<HashMap<String, Product>>>,
    movements: Arc<RwLock<Vec<StockMovement>>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_product(&self, product: Product) -> Result<bool> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Ok(false);
        }
        products.insert(product.id.clone(), product);
        Ok(true)
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn set_stock(&self, product_id: &str, expected: i64, new_stock: i64) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(product_id) {
            Some(product) if product.stock == expected => {
                product.stock = new_stock;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_movement(&self, movement: StockMovement) -> Result<()> {
        self.movements.write().await.push(movement);
        Ok(())
    }

    async fn movements(&self, product_id: &str) -> Result<Vec<StockMovement>> {
        let movements = self.movements.read().await;
        Ok(movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }
}
