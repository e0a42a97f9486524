mod common;

use axum::Router;
use axum::http::{Method, StatusCode};
use common::{ADMIN, BUYER, SELLER, app, call, decimal};
use rust_decimal_macros::dec;
use serde_json::{Value, json};

fn current_period() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

async fn ok(app: &Router, method: Method, uri: &str, token: &str, body: Option<Value>) -> Value {
    let (status, body) = call(app, method, uri, Some(token), body).await;
    assert_eq!(status, StatusCode::OK, "{} -> {}", uri, body);
    assert_eq!(body["success"], true);
    body["data"].clone()
}

async fn delivered_order(app: &Router, order_id: &str, store_id: &str, price: &str) {
    ok(
        app,
        Method::POST,
        "/api/orders",
        BUYER,
        Some(json!({
            "id": order_id,
            "items": [{
                "id": format!("{}-1", order_id),
                "product_id": "P1",
                "store_id": store_id,
                "quantity": 1,
                "unit_price": price
            }]
        })),
    )
    .await;
    ok(
        app,
        Method::PUT,
        &format!("/api/orders/{}/status", order_id),
        ADMIN,
        Some(json!({"status": "delivered"})),
    )
    .await;
}

#[tokio::test]
async fn test_payout_aggregates_month_of_commission() {
    let app = app();
    let store = ok(
        &app,
        Method::POST,
        "/api/stores",
        SELLER,
        Some(json!({"id": "S1", "name": "Corner Shop"})),
    )
    .await;
    assert_eq!(store["status"], "pending");
    ok(
        &app,
        Method::POST,
        "/api/stores/approval",
        ADMIN,
        Some(json!({"store_id": "S1", "action": "approve", "notes": "ok"})),
    )
    .await;
    ok(
        &app,
        Method::PUT,
        "/api/stores/S1/commission-rate",
        ADMIN,
        Some(json!({"commission_rate": "0.15"})),
    )
    .await;

    delivered_order(&app, "O1", "S1", "100.00").await;
    delivered_order(&app, "O2", "S1", "150.00").await;

    let period = current_period();
    let txs = ok(
        &app,
        Method::GET,
        &format!("/api/commissions?store_id=S1&period={}", period),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(txs.as_array().unwrap().len(), 2);

    let payout = ok(
        &app,
        Method::POST,
        "/api/payouts",
        ADMIN,
        Some(json!({"store_id": "S1", "period": period})),
    )
    .await;
    assert_eq!(decimal(&payout["amount"]), dec!(37.50));
    assert_eq!(payout["transaction_count"], 2);
    assert_eq!(payout["status"], "pending");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/payouts",
        Some(ADMIN),
        Some(json!({"store_id": "S1", "period": period})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let id = payout["id"].as_str().unwrap();
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/payouts/{}", id),
        Some(ADMIN),
        Some(json!({"action": "process"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ok(&app, Method::PUT, &format!("/api/payouts/{}", id), ADMIN, Some(json!({"action": "approve"}))).await;
    let done = ok(
        &app,
        Method::PUT,
        &format!("/api/payouts/{}", id),
        ADMIN,
        Some(json!({"action": "process", "payment_reference": "WIRE-1"})),
    )
    .await;
    assert_eq!(done["status"], "completed");
    assert_eq!(done["payment_reference"], "WIRE-1");

    let (status, _) = call(&app, Method::GET, "/api/payouts", Some(SELLER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_approve_reports_per_item() {
    let app = app();
    let period = current_period();
    let mut ids = Vec::new();
    for store in ["S1", "S2", "S3"] {
        delivered_order(&app, &format!("O-{}", store), store, "100").await;
        let payout = ok(
            &app,
            Method::POST,
            "/api/payouts",
            ADMIN,
            Some(json!({"store_id": store, "period": period})),
        )
        .await;
        ids.push(payout["id"].as_str().unwrap().to_string());
    }
    ok(&app, Method::PUT, &format!("/api/payouts/{}", ids[1]), ADMIN, Some(json!({"action": "reject"}))).await;

    let report = ok(
        &app,
        Method::POST,
        "/api/payouts/bulk",
        ADMIN,
        Some(json!({"payout_ids": ids, "action": "approve", "notes": "batch"})),
    )
    .await;
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["results"][1]["ok"], false);

    for id in [&ids[0], &ids[2]] {
        let payout = ok(&app, Method::GET, &format!("/api/payouts/{}", id), ADMIN, None).await;
        assert_eq!(payout["status"], "processing");
        assert_eq!(payout["notes"], "batch");
    }
    let listed = ok(&app, Method::GET, "/api/payouts?status=processing", ADMIN, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_moderation_endpoints() {
    let app = app();
    for id in ["S1", "S2"] {
        ok(&app, Method::POST, "/api/stores", ADMIN, Some(json!({"id": id, "name": id}))).await;
    }
    let report = ok(
        &app,
        Method::PUT,
        "/api/stores/approval",
        ADMIN,
        Some(json!({"store_ids": ["S1", "S2", "S9"], "action": "approve"})),
    )
    .await;
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["failed"], 1);

    let stats = ok(&app, Method::GET, "/api/stores/approval/stats", ADMIN, None).await;
    assert_eq!(stats["approved"], 2);
    assert_eq!(stats["total"], 2);

    let approved = ok(&app, Method::GET, "/api/stores/approval?status=approved", ADMIN, None).await;
    assert_eq!(approved.as_array().unwrap().len(), 2);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/stores/approval",
        Some(ADMIN),
        Some(json!({"store_id": "S1", "action": "reject"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_adjustments() {
    let app = app();
    ok(&app, Method::POST, "/api/stores", SELLER, Some(json!({"id": "S1", "name": "Shop"}))).await;
    ok(
        &app,
        Method::POST,
        "/api/products",
        SELLER,
        Some(json!({"id": "P1", "store_id": "S1", "name": "Widget", "stock": 5})),
    )
    .await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/products/P1/stock",
        Some(SELLER),
        Some(json!({"movement_type": "sale", "quantity": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let movement = ok(
        &app,
        Method::POST,
        "/api/products/P1/stock",
        SELLER,
        Some(json!({"movement_type": "restock", "quantity": 3, "reason": "delivery"})),
    )
    .await;
    assert_eq!(movement["previous_stock"], 5);
    assert_eq!(movement["new_stock"], 8);

    let history = ok(&app, Method::GET, "/api/products/P1/stock-movements", SELLER, None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::GET, "/api/products/P1/stock-movements", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/products/P1/stock",
        Some(SELLER),
        Some(json!({"movement_type": "teleport", "quantity": 1})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_order_with_repeated_item_id_is_rejected() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(BUYER),
        Some(json!({
            "id": "O2",
            "items": [
                {"id": "I1", "product_id": "P1", "store_id": "S1", "quantity": 1, "unit_price": "100"},
                {"id": "I1", "product_id": "P2", "store_id": "S2", "quantity": 1, "unit_price": "300"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, Method::GET, "/api/orders/O2", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
