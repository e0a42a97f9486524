use crate::domain::commission::CommissionTransaction;
use crate::domain::money::Rate;
use crate::domain::order::Order;
use crate::domain::payout::Period;
use crate::domain::ports::{CommissionStore, OrderStore, Repositories, StoreRegistry};
use crate::error::{MarketError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns finalized orders into commission transactions.
pub struct CommissionService {
    orders: Arc<dyn OrderStore>,
    stores: Arc<dyn StoreRegistry>,
    commissions: Arc<dyn CommissionStore>,
    default_rate: Rate,
}

impl CommissionService {
    pub fn new(repos: &Repositories, default_rate: Rate) -> Self {
        Self {
            orders: repos.orders.clone(),
            stores: repos.stores.clone(),
            commissions: repos.commissions.clone(),
            default_rate,
        }
    }

    pub fn default_rate(&self) -> Rate {
        self.default_rate
    }

    /// The rate a store is charged right now.
    pub async fn rate_for(&self, store_id: &str) -> Result<Rate> {
        match self.stores.get(store_id).await? {
            Some(store) => Ok(store.commission_rate.unwrap_or(self.default_rate)),
            None => {
                debug!(store_id, "Unregistered store, using default commission rate");
                Ok(self.default_rate)
            }
        }
    }

    pub async fn record_order(&self, order_id: &str) -> Result<Vec<CommissionTransaction>> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Order {}", order_id)))?;
        self.record_for(&order).await
    }

    /// Records one transaction per order item, snapshotting each store's rate.
    ///
    /// Items that already have a transaction are left untouched, so calling
    /// this again for the same order returns the original rows.
    pub async fn record_for(&self, order: &Order) -> Result<Vec<CommissionTransaction>> {
        if !order.status.qualifies_for_commission() {
            return Err(MarketError::Validation(format!(
                "Order {} is {:?}; commission is recorded once it is confirmed or delivered",
                order.id, order.status
            )));
        }

        let mut rates: HashMap<&str, Rate> = HashMap::new();
        let mut created = 0usize;
        for item in &order.items {
            let rate = match rates.get(item.store_id.as_str()) {
                Some(rate) => *rate,
                None => {
                    let rate = self.rate_for(&item.store_id).await?;
                    rates.insert(item.store_id.as_str(), rate);
                    rate
                }
            };
            let tx = CommissionTransaction::for_item(&order.id, item, rate, order.updated_at);
            if self.commissions.insert_if_absent(tx).await? {
                created += 1;
            }
        }

        if created > 0 {
            info!(order_id = %order.id, created, "Commission recorded");
        }
        self.commissions.for_order(&order.id).await
    }

    pub async fn transactions(
        &self,
        store_id: &str,
        period: Period,
    ) -> Result<Vec<CommissionTransaction>> {
        let (from, to) = period.range()?;
        self.commissions.for_store(store_id, from, to).await
    }
}
