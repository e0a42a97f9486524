use super::commission::CommissionService;
use super::coupons::CouponService;
use super::orders::OrderService;
use super::payouts::PayoutLedger;
use super::stock::StockLedger;
use super::stores::StoreModeration;
use crate::domain::money::Rate;
use crate::domain::ports::{IdentityProvider, Repositories};
use std::sync::Arc;

/// Every service the request handlers and the batch runner need.
///
/// Built once at startup and cloned into each handler; all members are
/// shared behind `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppContext {
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub commission: Arc<CommissionService>,
    pub payouts: Arc<PayoutLedger>,
    pub stores: Arc<StoreModeration>,
    pub stock: Arc<StockLedger>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppContext {
    pub fn new(
        repos: &Repositories,
        identity: Arc<dyn IdentityProvider>,
        default_rate: Rate,
    ) -> Self {
        let commission = Arc::new(CommissionService::new(repos, default_rate));
        Self {
            coupons: Arc::new(CouponService::new(repos)),
            orders: Arc::new(OrderService::new(repos, commission.clone())),
            commission,
            payouts: Arc::new(PayoutLedger::new(repos)),
            stores: Arc::new(StoreModeration::new(repos)),
            stock: Arc::new(StockLedger::new(repos)),
            identity,
        }
    }
}
