use super::auth::CurrentUser;
use super::extract::{ApiPath, ApiQuery};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::domain::commission::CommissionTransaction;
use crate::domain::payout::Period;
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/commissions", get(list))
        .route("/api/commissions/orders/{id}", post(record))
}

#[derive(Debug, Deserialize)]
pub struct CommissionQuery {
    pub store_id: String,
    pub period: Period,
}

async fn list(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<CommissionQuery>,
) -> ApiResult<Vec<CommissionTransaction>> {
    user.require_admin()?;
    let transactions = ctx
        .commission
        .transactions(&query.store_id, query.period)
        .await?;
    Ok(ApiResponse::ok(transactions))
}

async fn record(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(order_id): ApiPath<String>,
) -> ApiResult<Vec<CommissionTransaction>> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.commission.record_order(&order_id).await?))
}
