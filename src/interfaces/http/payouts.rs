use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::application::bulk::BulkReport;
use crate::domain::payout::{CommissionPayout, PayoutAction, PayoutStatus, Period};
use crate::domain::ports::PayoutFilter;
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/payouts", get(list).post(create))
        .route("/api/payouts/bulk", post(bulk_moderate))
        .route("/api/payouts/{id}", get(read).put(moderate))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub store_id: Option<String>,
    pub status: Option<PayoutStatus>,
    pub period: Option<Period>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub store_id: String,
    pub period: Period,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub action: PayoutAction,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkModerateRequest {
    pub payout_ids: Vec<Uuid>,
    pub action: PayoutAction,
    #[serde(default)]
    pub notes: Option<String>,
}

async fn list(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<CommissionPayout>> {
    user.require_admin()?;
    let filter = PayoutFilter {
        store_id: query.store_id,
        status: query.status,
        period: query.period,
    };
    Ok(ApiResponse::ok(ctx.payouts.list(&filter).await?))
}

async fn create(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateRequest>,
) -> ApiResult<CommissionPayout> {
    user.require_admin()?;
    let payout = ctx.payouts.create_payout(&req.store_id, req.period).await?;
    Ok(ApiResponse::ok(payout))
}

async fn read(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<CommissionPayout> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.payouts.get(id).await?))
}

async fn moderate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ModerateRequest>,
) -> ApiResult<CommissionPayout> {
    user.require_admin()?;
    let payout = ctx
        .payouts
        .moderate(
            id,
            req.action,
            req.notes.as_deref(),
            req.payment_reference.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(payout))
}

async fn bulk_moderate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<BulkModerateRequest>,
) -> ApiResult<BulkReport<PayoutStatus>> {
    user.require_admin()?;
    let report = ctx
        .payouts
        .bulk_moderate(&req.payout_ids, req.action, req.notes.as_deref())
        .await;
    Ok(ApiResponse::ok(report))
}
