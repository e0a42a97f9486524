mod common;

use axum::http::{Method, StatusCode};
use common::{ADMIN, BUYER, OTHER_BUYER, app, call, decimal};
use rust_decimal_macros::dec;
use serde_json::json;

async fn seed_coupons(app: &axum::Router) {
    for (code, discount) in [
        ("SAVE10", json!({"type": "percentage", "value": 10})),
        ("FLAT50", json!({"type": "fixed_amount", "value": 50})),
    ] {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/admin/coupons",
            Some(ADMIN),
            Some(json!({"code": code, "discount": discount})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }
}

async fn seed_order(app: &axum::Router, id: &str, token: &str) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/orders",
        Some(token),
        Some(json!({
            "id": id,
            "items": [{
                "id": "I1",
                "product_id": "P1",
                "store_id": "S1",
                "quantity": 1,
                "unit_price": "200"
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_evaluate_orders_by_savings() {
    let app = app();
    seed_coupons(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coupons/evaluate",
        Some(BUYER),
        Some(json!({"cart_total": 200})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let general = body["data"]["general"].as_array().unwrap();
    assert_eq!(general.len(), 2);
    assert_eq!(general[0]["coupon"]["code"], "FLAT50");
    assert_eq!(decimal(&general[0]["estimated_savings"]), dec!(50));
    assert_eq!(general[1]["coupon"]["code"], "SAVE10");
    assert_eq!(decimal(&general[1]["estimated_savings"]), dec!(20));
    assert!(body["data"]["auto_apply"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_apply_remove_and_reapply() {
    let app = app();
    seed_coupons(&app).await;
    seed_order(&app, "O1", BUYER).await;

    let apply = |code: &'static str| {
        json!({"code": code, "order_id": "O1", "cart": {"cart_total": 200}})
    };

    let (status, body) = call(&app, Method::POST, "/api/coupons/apply", Some(BUYER), Some(apply("save10"))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(decimal(&body["data"]["discount"]), dec!(20));
    assert_eq!(decimal(&body["data"]["new_total"]), dec!(180));

    let (status, body) = call(&app, Method::POST, "/api/coupons/apply", Some(BUYER), Some(apply("FLAT50"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/coupons/remove",
        Some(OTHER_BUYER),
        Some(json!({"order_id": "O1"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/coupons/remove",
        Some(BUYER),
        Some(json!({"order_id": "O1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/coupons/apply", Some(BUYER), Some(apply("FLAT50"))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(decimal(&body["data"]["new_total"]), dec!(150));

    let (status, body) = call(&app, Method::GET, "/api/orders/O1", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["discount"]), dec!(50));
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app();
    seed_coupons(&app).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/coupons/evaluate",
        None,
        Some(json!({"cart_total": 200})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/admin/coupons", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/admin/coupons", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coupons/validate",
        Some(BUYER),
        Some(json!({"code": "NOPE", "cart": {"cart_total": 200}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/admin/coupons",
        Some(ADMIN),
        Some(json!({"code": "save10", "discount": {"type": "percentage", "value": 5}})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deactivated_coupon_is_rejected() {
    let app = app();
    seed_coupons(&app).await;
    let (_, body) = call(&app, Method::GET, "/api/admin/coupons", Some(ADMIN), None).await;
    let id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/admin/coupons/{}/deactivate", id),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/coupons/validate",
        Some(BUYER),
        Some(json!({"code": "SAVE10", "cart": {"cart_total": 200}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stored_order_is_priced_from_its_lines() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/admin/coupons",
        Some(ADMIN),
        Some(json!({
            "code": "BIG10",
            "discount": {"type": "percentage", "value": 10},
            "minimum_order_value": "500"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    seed_order(&app, "O1", BUYER).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coupons/apply",
        Some(BUYER),
        Some(json!({"code": "BIG10", "order_id": "O1", "cart": {"cart_total": "1000"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("minimum order value"));

    let (_, body) = call(&app, Method::GET, "/api/orders/O1", Some(BUYER), None).await;
    assert_eq!(decimal(&body["data"]["discount"]), dec!(0));
}

#[tokio::test]
async fn test_malformed_input_uses_failure_envelope() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/coupons/apply",
        Some(BUYER),
        Some(json!({"code": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, Method::GET, "/api/payouts/not-a-uuid", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/payouts?status=bogus",
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
