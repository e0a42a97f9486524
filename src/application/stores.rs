use super::bulk::BulkReport;
use crate::domain::identity::Identity;
use crate::domain::money::Rate;
use crate::domain::ports::{Repositories, StoreRegistry};
use crate::domain::store::{Store, StoreAction, StoreStatus};
use crate::error::{MarketError, Result};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct NewStore {
    pub id: String,
    pub name: String,
    /// Admins may register a store on behalf of a seller.
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub suspended: usize,
    pub total: usize,
}

pub struct StoreModeration {
    stores: Arc<dyn StoreRegistry>,
}

impl StoreModeration {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            stores: repos.stores.clone(),
        }
    }

    pub async fn register(&self, actor: &Identity, new_store: NewStore) -> Result<Store> {
        actor.require_seller_or_admin()?;
        let owner_id = match new_store.owner_id {
            Some(owner) if actor.is_admin() => owner,
            _ => actor.id.clone(),
        };
        let store = Store::new(new_store.id, new_store.name, owner_id, Utc::now())?;
        if !self.stores.insert(store.clone()).await? {
            return Err(MarketError::Conflict(format!(
                "Store {} already exists",
                store.id
            )));
        }
        info!(store_id = %store.id, owner_id = %store.owner_id, "Store registered");
        Ok(store)
    }

    pub async fn get(&self, store_id: &str) -> Result<Store> {
        self.stores
            .get(store_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Store {}", store_id)))
    }

    pub async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>> {
        self.stores.list(status).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();
        for store in self.stores.list(None).await? {
            match store.status {
                StoreStatus::Pending => stats.pending += 1,
                StoreStatus::Approved => stats.approved += 1,
                StoreStatus::Rejected => stats.rejected += 1,
                StoreStatus::Suspended => stats.suspended += 1,
            }
            stats.total += 1;
        }
        Ok(stats)
    }

    pub async fn moderate(
        &self,
        store_id: &str,
        action: StoreAction,
        note: Option<&str>,
    ) -> Result<Store> {
        let current = self.get(store_id).await?;
        let status = current.status.apply(action)?;
        let mut next = current.clone();
        next.status = status;
        next.updated_at = Utc::now();
        if let Some(note) = note {
            next.moderation_note = Some(note.to_string());
        }
        if !self.stores.compare_and_swap(current.status, next.clone()).await? {
            return Err(MarketError::Conflict(format!(
                "Store {} was modified concurrently",
                store_id
            )));
        }
        info!(
            target: "audit",
            store_id,
            from = %current.status,
            to = %status,
            %action,
            "Store moderated"
        );
        Ok(next)
    }

    pub async fn bulk_moderate(
        &self,
        store_ids: &[String],
        action: StoreAction,
        note: Option<&str>,
    ) -> BulkReport<StoreStatus> {
        let outcomes = join_all(store_ids.iter().map(|id| async move {
            let outcome = self
                .moderate(id, action, note)
                .await
                .map(|store| store.status);
            (id.clone(), outcome)
        }))
        .await;
        let report = BulkReport::collect(outcomes);
        info!(
            target: "audit",
            %action,
            succeeded = report.succeeded,
            failed = report.failed,
            "Bulk store moderation"
        );
        report
    }

    /// Changes the rate used for future commission; recorded transactions keep theirs.
    pub async fn set_commission_rate(&self, store_id: &str, rate: Option<Rate>) -> Result<Store> {
        let mut store = self.get(store_id).await?;
        store.commission_rate = rate;
        store.updated_at = Utc::now();
        self.stores.update(store.clone()).await?;
        info!(
            target: "audit",
            store_id,
            rate = ?rate.map(|r| r.to_string()),
            "Commission rate updated"
        );
        Ok(store)
    }
}
