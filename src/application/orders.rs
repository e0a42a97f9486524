use super::commission::CommissionService;
use crate::domain::commission::CommissionTransaction;
use crate::domain::identity::Identity;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::domain::ports::{OrderStore, Repositories, StoreRegistry};
use crate::error::{MarketError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct NewOrder {
    #[serde(default)]
    pub id: Option<String>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OrderUpdate {
    pub order: Order,
    pub commissions: Vec<CommissionTransaction>,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    stores: Arc<dyn StoreRegistry>,
    commission: Arc<CommissionService>,
}

impl OrderService {
    pub fn new(repos: &Repositories, commission: Arc<CommissionService>) -> Self {
        Self {
            orders: repos.orders.clone(),
            stores: repos.stores.clone(),
            commission,
        }
    }

    pub async fn create(&self, buyer_id: &str, new_order: NewOrder) -> Result<Order> {
        let id = new_order
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.orders.get(&id).await?.is_some() {
            return Err(MarketError::Conflict(format!("Order {} already exists", id)));
        }
        let order = Order::new(id, buyer_id, new_order.items, Utc::now())?;
        self.orders.store(order.clone()).await?;
        info!(order_id = %order.id, buyer_id, subtotal = %order.subtotal(), "Order created");
        Ok(order)
    }

    pub async fn get(&self, order_id: &str) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Order {}", order_id)))
    }

    /// Sellers may only move orders whose every item belongs to one of their stores.
    async fn ensure_can_manage(&self, actor: &Identity, order: &Order) -> Result<()> {
        actor.require_seller_or_admin()?;
        if actor.is_admin() {
            return Ok(());
        }
        for item in &order.items {
            let owned = self
                .stores
                .get(&item.store_id)
                .await?
                .is_some_and(|store| store.owner_id == actor.id);
            if !owned {
                return Err(MarketError::Permission(format!(
                    "Order {} contains items from a store you do not own",
                    order.id
                )));
            }
        }
        Ok(())
    }

    /// Moves the order to `status`; reaching a qualifying status records commission.
    pub async fn update_status(
        &self,
        actor: &Identity,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<OrderUpdate> {
        let mut order = self.get(order_id).await?;
        self.ensure_can_manage(actor, &order).await?;

        if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Refunded)
            && order.status != status
        {
            return Err(MarketError::InvalidTransition {
                from: format!("{:?}", order.status).to_lowercase(),
                action: format!("move to {:?}", status).to_lowercase(),
            });
        }

        if order.status != status {
            order.status = status;
            order.updated_at = Utc::now();
            self.orders.store(order.clone()).await?;
            info!(order_id, status = ?status, actor = %actor.id, "Order status updated");
        }

        let commissions = if status.qualifies_for_commission() {
            self.commission.record_for(&order).await?
        } else {
            Vec::new()
        };
        Ok(OrderUpdate { order, commissions })
    }
}
