use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::application::orders::{NewOrder, OrderUpdate};
use crate::domain::order::{Order, OrderStatus};
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/orders", post(create))
        .route("/api/orders/{id}", get(read))
        .route("/api/orders/{id}/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

async fn create(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(new_order): ApiJson<NewOrder>,
) -> ApiResult<Order> {
    Ok(ApiResponse::ok(ctx.orders.create(&user.id, new_order).await?))
}

async fn read(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Order> {
    let order = ctx.orders.get(&id).await?;
    user.require_owner(&order.user_id)?;
    Ok(ApiResponse::ok(order))
}

async fn update_status(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<OrderUpdate> {
    let update = ctx.orders.update_status(&user, &id, req.status).await?;
    Ok(ApiResponse::ok(update))
}
