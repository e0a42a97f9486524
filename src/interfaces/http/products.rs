use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiPath};
use super::response::{ApiResponse, ApiResult};
use crate::application::AppContext;
use crate::application::stock::{NewProduct, StockAdjustment};
use crate::domain::stock::{Product, StockMovement};
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/api/products", post(register))
        .route("/api/products/{id}/stock", post(adjust_stock))
        .route("/api/products/{id}/stock-movements", get(movements))
}

async fn register(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiJson(new_product): ApiJson<NewProduct>,
) -> ApiResult<Product> {
    Ok(ApiResponse::ok(
        ctx.stock.register_product(&user, new_product).await?,
    ))
}

async fn adjust_stock(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(adjustment): ApiJson<StockAdjustment>,
) -> ApiResult<StockMovement> {
    let movement = ctx.stock.adjust_stock(&user, &id, adjustment).await?;
    Ok(ApiResponse::ok(movement))
}

async fn movements(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Vec<StockMovement>> {
    Ok(ApiResponse::ok(ctx.stock.movements(&user, &id).await?))
}
