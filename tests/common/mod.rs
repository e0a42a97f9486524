#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use market_settle::application::AppContext;
use market_settle::domain::identity::{Identity, UserKind};
use market_settle::domain::money::Rate;
use market_settle::infrastructure::in_memory;
use market_settle::infrastructure::static_tokens::StaticTokenProvider;
use market_settle::interfaces::http::build_app;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const ADMIN: &str = "t-admin";
pub const BUYER: &str = "t-buyer";
pub const OTHER_BUYER: &str = "t-buyer-2";
pub const SELLER: &str = "t-seller";

pub fn app() -> Router {
    let tokens = StaticTokenProvider::default()
        .with_token(ADMIN, Identity::new("root", UserKind::Admin))
        .with_token(BUYER, Identity::new("U1", UserKind::Buyer))
        .with_token(OTHER_BUYER, Identity::new("U2", UserKind::Buyer))
        .with_token(SELLER, Identity::new("seller-1", UserKind::Seller));
    let ctx = AppContext::new(
        &in_memory::repositories(),
        Arc::new(tokens),
        Rate::new(dec!(0.10)).unwrap(),
    );
    build_app(ctx, Duration::from_secs(5))
}

/// Sends one request through the router and returns the status and JSON body.
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Reads a decimal that may be encoded as a JSON string or number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

/// Writes an orders CSV with `rows` delivered lines spread over `stores`, all in January 2024.
pub fn generate_orders_csv(path: &Path, rows: usize, stores: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["order_id", "store_id", "amount", "status", "date"])?;
    for i in 1..=rows {
        let store = format!("S{}", (i % stores) + 1);
        let day = format!("2024-01-{:02}", (i % 28) + 1);
        wtr.write_record([
            format!("O{}", i).as_str(),
            store.as_str(),
            "10.00",
            "delivered",
            day.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
