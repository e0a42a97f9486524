use super::money::Money;
use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Statuses at which the order's items are final and commission is owed.
    pub fn qualifies_for_commission(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Delivered)
    }

    /// Whether an order in this status counts as a purchase in the buyer's history.
    pub fn counts_as_purchase(&self) -> bool {
        !matches!(self, Self::Pending | Self::Cancelled)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub store_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Line value. Orders built through [`Order::new`] are known not to overflow.
    pub fn amount(&self) -> Money {
        self.unit_price * rust_decimal::Decimal::from(self.quantity)
    }

    pub fn checked_amount(&self) -> Option<Money> {
        self.unit_price
            .checked_mul(rust_decimal::Decimal::from(self.quantity))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub discount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MarketError::Validation("Order id is required".to_string()));
        }
        if items.is_empty() {
            return Err(MarketError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut subtotal = Money::ZERO;
        for item in &items {
            if !seen.insert(item.id.clone()) {
                return Err(MarketError::Validation(format!(
                    "Item id {} appears more than once",
                    item.id
                )));
            }
            if item.quantity == 0 {
                return Err(MarketError::Validation(format!(
                    "Item {} has zero quantity",
                    item.id
                )));
            }
            if item.unit_price < Money::ZERO {
                return Err(MarketError::Validation(format!(
                    "Item {} has a negative price",
                    item.id
                )));
            }
            subtotal = item
                .checked_amount()
                .and_then(|amount| subtotal.checked_add(amount))
                .ok_or_else(|| {
                    MarketError::Validation(format!("Order {} total is out of range", id))
                })?;
        }
        Ok(Self {
            id,
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            items,
            discount: Money::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(OrderItem::amount).sum()
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount
    }

    /// Sets the order-level discount, clamped to the subtotal.
    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount.min(self.subtotal()).max(Money::ZERO);
    }
}
