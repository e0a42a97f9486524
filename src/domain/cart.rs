use super::money::Money;
use super::order::Order;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CartItem {
    pub product_id: String,
    pub store_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

/// What the shopper is about to buy, as seen by coupon evaluation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CartContext {
    pub cart_total: Money,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl CartContext {
    pub fn new(cart_total: Money) -> Self {
        Self {
            cart_total,
            items: Vec::new(),
            store_id: None,
            category_id: None,
        }
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_item(mut self, item: CartItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn touches_store(&self, store_id: &str) -> bool {
        self.store_id.as_deref() == Some(store_id)
            || self.items.iter().any(|item| item.store_id == store_id)
    }

    pub fn touches_category(&self, category_id: &str) -> bool {
        self.category_id.as_deref() == Some(category_id)
            || self
                .items
                .iter()
                .any(|item| item.category_id.as_deref() == Some(category_id))
    }
}

/// A stored order priced from its own lines, ignoring anything the client claims.
impl From<&Order> for CartContext {
    fn from(order: &Order) -> Self {
        Self {
            cart_total: order.subtotal(),
            items: order
                .items
                .iter()
                .map(|item| CartItem {
                    product_id: item.product_id.clone(),
                    store_id: item.store_id.clone(),
                    category_id: item.category_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            store_id: None,
            category_id: None,
        }
    }
}
