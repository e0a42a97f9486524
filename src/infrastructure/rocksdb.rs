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
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const CF_COUPONS: &str = "coupons";
pub const CF_APPLICATIONS: &str = "coupon_applications";
pub const CF_ORDERS: &str = "orders";
pub const CF_STORES: &str = "stores";
pub const CF_COMMISSIONS: &str = "commissions";
pub const CF_PAYOUTS: &str = "payouts";
pub const CF_PRODUCTS: &str = "products";
pub const CF_MOVEMENTS: &str = "stock_movements";

const COLUMN_FAMILIES: [&str; 8] = [
    CF_COUPONS,
    CF_APPLICATIONS,
    CF_ORDERS,
    CF_STORES,
    CF_COMMISSIONS,
    CF_PAYOUTS,
    CF_PRODUCTS,
    CF_MOVEMENTS,
];

/// A persistent store implementation using RocksDB.
///
/// Every entity lives in its own column family as JSON. Conditional writes
/// (insert-if-absent, compare-and-swap) are serialized through `write_lock`
/// so that the read-check-write sequence is atomic for this process.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path` with all column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn repositories(self) -> Repositories {
        Repositories {
            coupons: Arc::new(self.clone()),
            applications: Arc::new(self.clone()),
            orders: Arc::new(self.clone()),
            stores: Arc::new(self.clone()),
            commissions: Arc::new(self.clone()),
            payouts: Arc::new(self.clone()),
            inventory: Arc::new(self),
        }
    }

    fn handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| MarketError::internal(format!("{} column family not found", name)))
    }

    fn put<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let handle = self.handle(cf)?;
        self.db.put_cf(handle, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let handle = self.handle(cf)?;
        match self.db.get_cf(handle, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, cf: &str, key: &[u8]) -> Result<()> {
        let handle = self.handle(cf)?;
        self.db.delete_cf(handle, key)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        self.scan_prefix(cf, &[])
    }

    /// Values whose key starts with `prefix`, in key order.
    fn scan_prefix<T: DeserializeOwned>(&self, cf: &str, prefix: &[u8]) -> Result<Vec<T>> {
        let handle = self.handle(cf)?;
        let mode = if prefix.is_empty() {
            IteratorMode::Start
        } else {
            IteratorMode::From(prefix, Direction::Forward)
        };

        let mut values = Vec::new();
        for item in self.db.iterator_cf(handle, mode) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

fn commission_key(order_id: &str, order_item_id: &str) -> Vec<u8> {
    format!("{}\0{}", order_id, order_item_id).into_bytes()
}

fn movement_prefix(product_id: &str) -> Vec<u8> {
    format!("{}\0", product_id).into_bytes()
}

fn movement_key(movement: &StockMovement) -> Vec<u8> {
    let nanos = movement.created_at.timestamp_nanos_opt().unwrap_or_default();
    let mut key = movement_prefix(&movement.product_id);
    key.extend_from_slice(&nanos.to_be_bytes());
    key.extend_from_slice(movement.id.as_bytes());
    key
}

#[async_trait]
impl CouponStore for RocksDBStore {
    async fn insert(&self, coupon: Coupon) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let existing: Vec<Coupon> = self.scan(CF_COUPONS)?;
        if existing.iter().any(|c| c.code == coupon.code) {
            return Ok(false);
        }
        self.put(CF_COUPONS, coupon.id.as_bytes(), &coupon)?;
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Coupon>> {
        self.fetch(CF_COUPONS, id.as_bytes())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let code = normalize_code(code);
        let coupons: Vec<Coupon> = self.scan(CF_COUPONS)?;
        Ok(coupons.into_iter().find(|c| c.code == code))
    }

    async fn list(&self) -> Result<Vec<Coupon>> {
        let mut coupons: Vec<Coupon> = self.scan(CF_COUPONS)?;
        coupons.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        Ok(coupons)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut coupon) = self.fetch::<Coupon>(CF_COUPONS, id.as_bytes())? else {
            return Ok(false);
        };
        coupon.active = active;
        self.put(CF_COUPONS, id.as_bytes(), &coupon)?;
        Ok(true)
    }

    async fn increment_usage(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut coupon) = self.fetch::<Coupon>(CF_COUPONS, id.as_bytes())? else {
            return Ok(false);
        };
        if coupon.usage_limit.is_some_and(|limit| coupon.usage_count >= limit) {
            return Ok(false);
        }
        coupon.usage_count += 1;
        self.put(CF_COUPONS, id.as_bytes(), &coupon)?;
        Ok(true)
    }

    async fn decrement_usage(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(mut coupon) = self.fetch::<Coupon>(CF_COUPONS, id.as_bytes())? {
            coupon.usage_count = coupon.usage_count.saturating_sub(1);
            self.put(CF_COUPONS, id.as_bytes(), &coupon)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CouponApplicationStore for RocksDBStore {
    async fn insert_if_absent(&self, application: CouponApplication) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = application.order_id.as_bytes();
        if self.fetch::<CouponApplication>(CF_APPLICATIONS, key)?.is_some() {
            return Ok(false);
        }
        self.put(CF_APPLICATIONS, key, &application)?;
        Ok(true)
    }

    async fn get_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>> {
        self.fetch(CF_APPLICATIONS, order_id.as_bytes())
    }

    async fn remove_for_order(&self, order_id: &str) -> Result<Option<CouponApplication>> {
        let _guard = self.write_lock.lock().await;
        let existing = self.fetch(CF_APPLICATIONS, order_id.as_bytes())?;
        if existing.is_some() {
            self.delete(CF_APPLICATIONS, order_id.as_bytes())?;
        }
        Ok(existing)
    }

    async fn count_for_user(&self, user_id: &str, coupon_id: Uuid) -> Result<usize> {
        let applications: Vec<CouponApplication> = self.scan(CF_APPLICATIONS)?;
        Ok(applications
            .iter()
            .filter(|a| a.user_id == user_id && a.coupon_id == coupon_id)
            .count())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn store(&self, order: Order) -> Result<()> {
        self.put(CF_ORDERS, order.id.as_bytes(), &order)
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        self.fetch(CF_ORDERS, order_id.as_bytes())
    }

    async fn count_purchases(&self, user_id: &str) -> Result<usize> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .iter()
            .filter(|o| o.user_id == user_id && o.status.counts_as_purchase())
            .count())
    }
}

#[async_trait]
impl StoreRegistry for RocksDBStore {
    async fn insert(&self, store: Store) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.fetch::<Store>(CF_STORES, store.id.as_bytes())?.is_some() {
            return Ok(false);
        }
        self.put(CF_STORES, store.id.as_bytes(), &store)?;
        Ok(true)
    }

    async fn get(&self, store_id: &str) -> Result<Option<Store>> {
        self.fetch(CF_STORES, store_id.as_bytes())
    }

    async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>> {
        let mut stores: Vec<Store> = self.scan(CF_STORES)?;
        stores.retain(|s| status.is_none_or(|st| st == s.status));
        stores.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(stores)
    }

    async fn compare_and_swap(&self, expected: StoreStatus, store: Store) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.fetch::<Store>(CF_STORES, store.id.as_bytes())? {
            Some(current) if current.status == expected => {
                self.put(CF_STORES, store.id.as_bytes(), &store)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update(&self, store: Store) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put(CF_STORES, store.id.as_bytes(), &store)
    }
}

#[async_trait]
impl CommissionStore for RocksDBStore {
    async fn insert_if_absent(&self, tx: CommissionTransaction) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = commission_key(&tx.order_id, &tx.order_item_id);
        if self
            .fetch::<CommissionTransaction>(CF_COMMISSIONS, &key)?
            .is_some()
        {
            return Ok(false);
        }
        self.put(CF_COMMISSIONS, &key, &tx)?;
        Ok(true)
    }

    async fn for_order(&self, order_id: &str) -> Result<Vec<CommissionTransaction>> {
        let prefix = format!("{}\0", order_id).into_bytes();
        self.scan_prefix(CF_COMMISSIONS, &prefix)
    }

    async fn for_store(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CommissionTransaction>> {
        let mut transactions: Vec<CommissionTransaction> = self.scan(CF_COMMISSIONS)?;
        transactions
            .retain(|t| t.store_id == store_id && t.created_at >= from && t.created_at < to);
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(transactions)
    }
}

#[async_trait]
impl PayoutStore for RocksDBStore {
    async fn insert_unique(&self, payout: CommissionPayout) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let existing: Vec<CommissionPayout> = self.scan(CF_PAYOUTS)?;
        if existing
            .iter()
            .any(|p| p.store_id == payout.store_id && p.period == payout.period)
        {
            return Ok(false);
        }
        self.put(CF_PAYOUTS, payout.id.as_bytes(), &payout)?;
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CommissionPayout>> {
        self.fetch(CF_PAYOUTS, id.as_bytes())
    }

    async fn list(&self, filter: &PayoutFilter) -> Result<Vec<CommissionPayout>> {
        let mut payouts: Vec<CommissionPayout> = self.scan(CF_PAYOUTS)?;
        payouts.retain(|p| filter.matches(p));
        payouts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(payouts)
    }

    async fn compare_and_swap(
        &self,
        expected: PayoutStatus,
        payout: CommissionPayout,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.fetch::<CommissionPayout>(CF_PAYOUTS, payout.id.as_bytes())? {
            Some(current) if current.status == expected => {
                self.put(CF_PAYOUTS, payout.id.as_bytes(), &payout)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl InventoryStore for RocksDBStore {
    async fn insert_product(&self, product: Product) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self
            .fetch::<Product>(CF_PRODUCTS, product.id.as_bytes())?
            .is_some()
        {
            return Ok(false);
        }
        self.put(CF_PRODUCTS, product.id.as_bytes(), &product)?;
        Ok(true)
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        self.fetch(CF_PRODUCTS, product_id.as_bytes())
    }

    async fn set_stock(&self, product_id: &str, expected: i64, new_stock: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.fetch::<Product>(CF_PRODUCTS, product_id.as_bytes())? {
            Some(mut product) if product.stock == expected => {
                product.stock = new_stock;
                self.put(CF_PRODUCTS, product_id.as_bytes(), &product)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_movement(&self, movement: StockMovement) -> Result<()> {
        self.put(CF_MOVEMENTS, &movement_key(&movement), &movement)
    }

    async fn movements(&self, product_id: &str) -> Result<Vec<StockMovement>> {
        self.scan_prefix(CF_MOVEMENTS, &movement_prefix(product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coupon::fixtures;
    use crate::domain::money::{Money, Rate};
    use crate::domain::order::OrderItem;
    use crate::domain::stock::MovementType;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for cf in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(cf).is_some(), "missing {}", cf);
        }
    }

    #[tokio::test]
    async fn test_rocksdb_coupon_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let coupon = fixtures::fixed("ROCK", dec!(5));
        assert!(CouponStore::insert(&store, coupon.clone()).await.unwrap());
        assert!(!CouponStore::insert(&store, fixtures::fixed("rock", dec!(1))).await.unwrap());

        let found = store.find_by_code("rock").await.unwrap().unwrap();
        assert_eq!(found, coupon);
        assert!(store.increment_usage(coupon.id).await.unwrap());
        let reloaded = CouponStore::get(&store, coupon.id).await.unwrap().unwrap();
        assert_eq!(reloaded.usage_count, 1);
    }

    #[tokio::test]
    async fn test_rocksdb_payouts_survive_reopen() {
        let dir = tempdir().unwrap();
        let period = "2024-01".parse().unwrap();
        let payout = CommissionPayout::new("S1", period, Money::new(dec!(37.5)), 2, Utc::now());

        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            assert!(store.insert_unique(payout.clone()).await.unwrap());
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        assert_eq!(
            PayoutStore::get(&store, payout.id).await.unwrap(),
            Some(payout.clone())
        );
        let dup = CommissionPayout::new("S1", period, Money::new(dec!(1)), 1, Utc::now());
        assert!(!store.insert_unique(dup).await.unwrap());
    }

    #[tokio::test]
    async fn test_rocksdb_commission_prefix_scan() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let rate = Rate::new(dec!(0.1)).unwrap();
        let item = |id: &str| OrderItem {
            id: id.to_string(),
            product_id: "P".to_string(),
            store_id: "S1".to_string(),
            category_id: None,
            quantity: 1,
            unit_price: Money::new(dec!(10)),
        };

        let now = Utc::now();
        for (order, line) in [("O1", "a"), ("O1", "b"), ("O10", "a")] {
            let tx = CommissionTransaction::for_item(order, &item(line), rate, now);
            assert!(CommissionStore::insert_if_absent(&store, tx).await.unwrap());
        }

        assert_eq!(store.for_order("O1").await.unwrap().len(), 2);
        assert_eq!(store.for_order("O10").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_movements_oldest_first() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let now = Utc::now();

        for (i, offset) in [2i64, 0, 1].into_iter().enumerate() {
            let movement = StockMovement {
                id: Uuid::new_v4(),
                product_id: "P1".to_string(),
                movement_type: MovementType::Restock,
                quantity: 1,
                previous_stock: i as i64,
                new_stock: i as i64 + 1,
                reason: None,
                actor_id: "u1".to_string(),
                created_at: now + Duration::seconds(offset),
            };
            store.append_movement(movement).await.unwrap();
        }

        let movements = store.movements("P1").await.unwrap();
        assert_eq!(movements.len(), 3);
        assert!(movements.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
