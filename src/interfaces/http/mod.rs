//! JSON API over the application services.
//!
//! Every handler extracts the caller with [`auth::CurrentUser`] and answers
//! with the `{success, data}` / `{success, error}` envelope from [`response`].

pub mod auth;
mod commissions;
mod coupons;
pub mod extract;
mod orders;
mod payouts;
mod products;
pub mod response;
mod stores;

use crate::application::AppContext;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// All routes, without middleware or state.
pub fn build_router() -> Router<AppContext> {
    Router::new()
        .merge(coupons::router())
        .merge(orders::router())
        .merge(stores::router())
        .merge(commissions::router())
        .merge(payouts::router())
        .merge(products::router())
        .route("/health", get(health))
}

/// The fully layered application served by `serve` and used by tests.
pub fn build_app(ctx: AppContext, request_timeout: Duration) -> Router {
    build_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(ctx)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
