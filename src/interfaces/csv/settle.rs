use super::order_reader::{OrderLine, OrderReader, RateLine};
use crate::application::AppContext;
use crate::application::stores::NewStore;
use crate::domain::identity::{Identity, UserKind};
use crate::domain::money::{Money, Rate};
use crate::domain::order::{Order, OrderItem};
use crate::domain::payout::{CommissionPayout, Period};
use crate::error::{MarketError, Result};
use std::collections::BTreeSet;
use std::io::Read;
use tracing::{info, warn};

const BATCH_ACTOR: &str = "settlement-batch";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SettleSummary {
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub commissions_recorded: usize,
}

/// Batch settlement: records commission for every qualifying order line and
/// creates one payout per store for `period`.
pub struct Settlement<'a> {
    ctx: &'a AppContext,
    period: Period,
    actor: Identity,
}

impl<'a> Settlement<'a> {
    pub fn new(ctx: &'a AppContext, period: Period) -> Self {
        Self {
            ctx,
            period,
            actor: Identity::new(BATCH_ACTOR, UserKind::Admin),
        }
    }

    /// Registers per-store rate overrides, creating stores that do not exist yet.
    pub async fn load_rates<I>(&self, rates: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<RateLine>>,
    {
        let mut loaded = 0;
        for line in rates {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed rate line");
                    continue;
                }
            };
            let rate = match Rate::new(line.rate) {
                Ok(rate) => rate,
                Err(e) => {
                    warn!(store_id = %line.store_id, error = %e, "Skipping invalid rate");
                    continue;
                }
            };
            let new_store = NewStore {
                id: line.store_id.clone(),
                name: line.store_id.clone(),
                owner_id: None,
            };
            match self.ctx.stores.register(&self.actor, new_store).await {
                Ok(_) | Err(MarketError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
            self.ctx
                .stores
                .set_commission_rate(&line.store_id, Some(rate))
                .await?;
            loaded += 1;
        }
        Ok(loaded)
    }

    fn order_for(line: &OrderLine) -> Result<Order> {
        let item = OrderItem {
            id: line.store_id.clone(),
            product_id: line.store_id.clone(),
            store_id: line.store_id.clone(),
            category_id: None,
            quantity: 1,
            unit_price: Money::new(line.amount),
        };
        let mut order = Order::new(&line.order_id, BATCH_ACTOR, vec![item], line.date)?;
        order.status = line.status;
        Ok(order)
    }

    /// Reads order lines, then aggregates payouts for every store that
    /// earned commission in the period. Stores are settled in id order.
    pub async fn run<R: Read>(&self, input: R) -> Result<(Vec<CommissionPayout>, SettleSummary)> {
        let mut summary = SettleSummary::default();
        let mut stores = BTreeSet::new();

        for (index, line) in OrderReader::new(input).lines().enumerate() {
            summary.lines_read += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = index + 2, error = %e, "Skipping malformed order line");
                    summary.lines_skipped += 1;
                    continue;
                }
            };
            if !line.status.qualifies_for_commission() {
                continue;
            }
            let order = match Self::order_for(&line) {
                Ok(order) => order,
                Err(e) => {
                    warn!(line = index + 2, order_id = %line.order_id, error = %e, "Skipping invalid order line");
                    summary.lines_skipped += 1;
                    continue;
                }
            };
            self.ctx.commission.record_for(&order).await?;
            summary.commissions_recorded += 1;
            if self.period.contains(line.date) {
                stores.insert(line.store_id);
            }
        }

        let mut payouts = Vec::with_capacity(stores.len());
        for store_id in stores {
            match self.ctx.payouts.create_payout(&store_id, self.period).await {
                Ok(payout) => payouts.push(payout),
                Err(MarketError::Conflict(_)) => {
                    warn!(%store_id, period = %self.period, "Payout already exists, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            period = %self.period,
            lines = summary.lines_read,
            skipped = summary.lines_skipped,
            payouts = payouts.len(),
            "Settlement finished"
        );
        Ok((payouts, summary))
    }
}
