use crate::domain::identity::Identity;
use crate::domain::ports::{InventoryStore, Repositories, StoreRegistry};
use crate::domain::stock::{MovementType, Product, StockMovement};
use crate::error::{MarketError, Result};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct NewProduct {
    pub id: String,
    pub store_id: String,
    pub name: String,
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StockAdjustment {
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Product stock with an append-only movement history.
pub struct StockLedger {
    inventory: Arc<dyn InventoryStore>,
    stores: Arc<dyn StoreRegistry>,
}

impl StockLedger {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            inventory: repos.inventory.clone(),
            stores: repos.stores.clone(),
        }
    }

    async fn ensure_store_owner(&self, actor: &Identity, store_id: &str) -> Result<()> {
        if actor.is_admin() {
            return Ok(());
        }
        let store = self
            .stores
            .get(store_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Store {}", store_id)))?;
        actor.require_owner(&store.owner_id)
    }

    pub async fn register_product(&self, actor: &Identity, new_product: NewProduct) -> Result<Product> {
        actor.require_seller_or_admin()?;
        if new_product.id.trim().is_empty() || new_product.name.trim().is_empty() {
            return Err(MarketError::Validation(
                "Product id and name are required".to_string(),
            ));
        }
        if new_product.stock < 0 {
            return Err(MarketError::Validation(
                "Initial stock cannot be negative".to_string(),
            ));
        }
        self.ensure_store_owner(actor, &new_product.store_id).await?;

        let product = Product {
            id: new_product.id,
            store_id: new_product.store_id,
            name: new_product.name,
            stock: new_product.stock,
        };
        if !self.inventory.insert_product(product.clone()).await? {
            return Err(MarketError::Conflict(format!(
                "Product {} already exists",
                product.id
            )));
        }
        info!(product_id = %product.id, store_id = %product.store_id, stock = product.stock, "Product registered");
        Ok(product)
    }

    pub async fn product(&self, product_id: &str) -> Result<Product> {
        self.inventory
            .get_product(product_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Product {}", product_id)))
    }

    pub async fn adjust_stock(
        &self,
        actor: &Identity,
        product_id: &str,
        adjustment: StockAdjustment,
    ) -> Result<StockMovement> {
        let delta = adjustment.movement_type.delta(adjustment.quantity)?;
        let product = self.product(product_id).await?;
        self.ensure_store_owner(actor, &product.store_id).await?;

        let new_stock = product.stock.checked_add(delta).ok_or_else(|| {
            MarketError::Validation(format!(
                "Stock of product {} would overflow: have {}, change {}",
                product_id, product.stock, delta
            ))
        })?;
        if new_stock < 0 {
            warn!(product_id, stock = product.stock, delta, "Stock adjustment would go negative");
            return Err(MarketError::Validation(format!(
                "Insufficient stock for product {}: have {}, change {}",
                product_id, product.stock, delta
            )));
        }
        if !self
            .inventory
            .set_stock(product_id, product.stock, new_stock)
            .await?
        {
            return Err(MarketError::Conflict(format!(
                "Stock of product {} changed concurrently",
                product_id
            )));
        }

        let movement = StockMovement {
            id: Uuid::new_v4(),
            product_id: product_id.to_string(),
            movement_type: adjustment.movement_type,
            quantity: delta,
            previous_stock: product.stock,
            new_stock,
            reason: adjustment.reason,
            actor_id: actor.id.clone(),
            created_at: Utc::now(),
        };
        self.inventory.append_movement(movement.clone()).await?;
        info!(
            product_id,
            movement = ?movement.movement_type,
            previous = movement.previous_stock,
            new = movement.new_stock,
            "Stock adjusted"
        );
        Ok(movement)
    }

    pub async fn movements(&self, actor: &Identity, product_id: &str) -> Result<Vec<StockMovement>> {
        let product = self.product(product_id).await?;
        self.ensure_store_owner(actor, &product.store_id).await?;
        self.inventory.movements(product_id).await
    }
}
