use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::application::coupons::{AppliedCoupon, EvaluatedCoupon, Evaluation};
use crate::domain::cart::CartContext;
use crate::domain::coupon::{Coupon, CouponApplication, NewCoupon};
use crate::error::MarketError;
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/coupons/evaluate", post(evaluate))
        .route("/api/coupons/validate", post(validate))
        .route("/api/coupons/apply", post(apply))
        .route("/api/coupons/remove", post(remove))
        .route("/api/coupons/auto-apply", post(auto_apply))
        .route("/api/admin/coupons", get(list).post(create))
        .route("/api/admin/coupons/{id}/deactivate", post(deactivate))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub cart: CartContext,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub code: String,
    pub order_id: String,
    pub cart: CartContext,
}

#[derive(Debug, Deserialize)]
pub struct AutoApplyRequest {
    pub order_id: String,
    pub cart: CartContext,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub order_id: String,
}

async fn evaluate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(cart): ApiJson<CartContext>,
) -> ApiResult<Evaluation> {
    let evaluation = ctx.coupons.evaluate(&user.id, &cart).await?;
    Ok(ApiResponse::ok(evaluation))
}

async fn validate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ValidateRequest>,
) -> ApiResult<EvaluatedCoupon> {
    let coupon = ctx.coupons.validate(&user.id, &req.code, &req.cart).await?;
    Ok(ApiResponse::ok(coupon))
}

async fn apply(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<AppliedCoupon> {
    let applied = ctx
        .coupons
        .apply_coupon(&user.id, &req.code, &req.cart, &req.order_id)
        .await?;
    Ok(ApiResponse::ok(applied))
}

async fn auto_apply(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<AutoApplyRequest>,
) -> ApiResult<Option<AppliedCoupon>> {
    let applied = ctx
        .coupons
        .apply_best_coupon(&user.id, &req.cart, &req.order_id)
        .await?;
    Ok(ApiResponse::ok(applied))
}

async fn remove(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<RemoveRequest>,
) -> ApiResult<CouponApplication> {
    let existing = ctx
        .coupons
        .application_for_order(&req.order_id)
        .await?
        .ok_or_else(|| {
            MarketError::NotFound(format!("No coupon applied to order {}", req.order_id))
        })?;
    user.require_owner(&existing.user_id)?;
    let removed = ctx.coupons.remove_coupon(&req.order_id).await?;
    Ok(ApiResponse::ok(removed))
}

async fn list(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Coupon>> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.coupons.list_coupons().await?))
}

async fn create(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(new_coupon): ApiJson<NewCoupon>,
) -> ApiResult<Coupon> {
    user.require_admin()?;
    Ok(ApiResponse::ok(ctx.coupons.create_coupon(new_coupon).await?))
}

async fn deactivate(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    user.require_admin()?;
    ctx.coupons.deactivate(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id, "active": false })))
}
