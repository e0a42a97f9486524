use super::money::{Money, Rate};
use super::order::OrderItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commission owed on one order item. Never recomputed once written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CommissionTransaction {
    pub id: Uuid,
    pub order_id: String,
    pub order_item_id: String,
    pub store_id: String,
    pub order_amount: Money,
    /// Store rate at the time the transaction was recorded.
    pub commission_rate: Rate,
    pub commission_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl CommissionTransaction {
    pub fn for_item(order_id: &str, item: &OrderItem, rate: Rate, at: DateTime<Utc>) -> Self {
        let order_amount = item.amount();
        Self {
            id: Uuid::new_v4(),
            order_id: order_id.to_string(),
            order_item_id: item.id.clone(),
            store_id: item.store_id.clone(),
            order_amount,
            commission_rate: rate,
            commission_amount: rate.apply(order_amount),
            created_at: at,
        }
    }
}
