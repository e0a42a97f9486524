use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::application::bulk::BulkReport;
use crate::application::stores::{NewStore, StoreStats};
use crate::domain::money::Rate;
use crate::domain::store::{Store, StoreAction, StoreStatus};
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/stores", post(register))
        .route(
            "/api/stores/approval",
            get(list).post(moderate).put(bulk_moderate),
        )
        .route("/api/stores/approval/stats", get(stats))
        .route("/api/stores/{id}/commission-rate", put(set_commission_rate))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<StoreStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub store_id: String,
    pub action: StoreAction,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkModerateRequest {
    pub store_ids: Vec<String>,
    pub action: StoreAction,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    /// `null` reverts the store to the marketplace default.
    pub commission_rate: Option<Rate>,
}

async fn register(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(new_store): ApiJson<NewStore>,
) -> ApiResult<Store> {
    Ok(ApiResponse::ok(ctx.stores.register(&user, new_store).await?))
}

async fn list(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<Store>> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.stores.list(query.status).await?))
}

async fn stats(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<StoreStats> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.stores.stats().await?))
}

async fn moderate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ModerateRequest>,
) -> ApiResult<Store> {
    user.require_admin()?;
    let store = ctx
        .stores
        .moderate(&req.store_id, req.action, req.notes.as_deref())
        .await?;
    Ok(ApiResponse::ok(store))
}

async fn bulk_moderate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<BulkModerateRequest>,
) -> ApiResult<BulkReport<StoreStatus>> {
    user.require_admin()?;
    let report = ctx
        .stores
        .bulk_moderate(&req.store_ids, req.action, req.notes.as_deref())
        .await;
    Ok(ApiResponse::ok(report))
}

async fn set_commission_rate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<RateRequest>,
) -> ApiResult<Store> {
    user.require_admin()?;
    let store = ctx
        .stores
        .set_commission_rate(&id, req.commission_rate)
        .await?;
    Ok(ApiResponse::ok(store))
}
