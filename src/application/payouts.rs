use super::bulk::BulkReport;
use crate::domain::money::Money;
use crate::domain::payout::{CommissionPayout, PayoutAction, PayoutStatus, Period};
use crate::domain::ports::{CommissionStore, PayoutFilter, PayoutStore, Repositories};
use crate::error::{MarketError, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Aggregates commission into per-store monthly payouts and moves them
/// through the approval workflow.
pub struct PayoutLedger {
    commissions: Arc<dyn CommissionStore>,
    payouts: Arc<dyn PayoutStore>,
}

impl PayoutLedger {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            commissions: repos.commissions.clone(),
            payouts: repos.payouts.clone(),
        }
    }

    pub async fn create_payout(&self, store_id: &str, period: Period) -> Result<CommissionPayout> {
        if store_id.trim().is_empty() {
            return Err(MarketError::Validation("store_id is required".to_string()));
        }
        let (from, to) = period.range()?;
        let transactions = self.commissions.for_store(store_id, from, to).await?;
        if transactions.is_empty() {
            return Err(MarketError::Validation(format!(
                "Store {} has no commission transactions in {}",
                store_id, period
            )));
        }

        let amount: Money = transactions.iter().map(|t| t.commission_amount).sum();
        let payout =
            CommissionPayout::new(store_id, period, amount, transactions.len(), Utc::now());
        if !self.payouts.insert_unique(payout.clone()).await? {
            warn!(store_id, %period, "Duplicate payout rejected");
            return Err(MarketError::Conflict(format!(
                "A payout for store {} and period {} already exists",
                store_id, period
            )));
        }

        info!(
            target: "audit",
            payout_id = %payout.id,
            store_id,
            %period,
            %amount,
            transactions = payout.transaction_count,
            "Payout created"
        );
        Ok(payout)
    }

    pub async fn get(&self, id: Uuid) -> Result<CommissionPayout> {
        self.payouts
            .get(id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Payout {}", id)))
    }

    pub async fn list(&self, filter: &PayoutFilter) -> Result<Vec<CommissionPayout>> {
        self.payouts.list(filter).await
    }

    pub async fn moderate(
        &self,
        id: Uuid,
        action: PayoutAction,
        notes: Option<&str>,
        payment_reference: Option<&str>,
    ) -> Result<CommissionPayout> {
        let current = self.get(id).await?;
        let next = current.transitioned(action, notes, payment_reference, Utc::now())?;
        if !self.payouts.compare_and_swap(current.status, next.clone()).await? {
            return Err(MarketError::Conflict(format!(
                "Payout {} was modified concurrently",
                id
            )));
        }
        info!(
            target: "audit",
            payout_id = %id,
            from = %current.status,
            to = %next.status,
            %action,
            "Payout moderated"
        );
        Ok(next)
    }

    /// Applies `action` to every id concurrently. Each id succeeds or fails on
    /// its own; there is no atomicity across ids.
    pub async fn bulk_moderate(
        &self,
        ids: &[Uuid],
        action: PayoutAction,
        notes: Option<&str>,
    ) -> BulkReport<PayoutStatus> {
        let outcomes = join_all(ids.iter().map(|id| async move {
            let outcome = self
                .moderate(*id, action, notes, None)
                .await
                .map(|payout| payout.status);
            (id.to_string(), outcome)
        }))
        .await;
        let report = BulkReport::collect(outcomes);
        info!(
            target: "audit",
            %action,
            succeeded = report.succeeded,
            failed = report.failed,
            "Bulk payout moderation"
        );
        report
    }
}
