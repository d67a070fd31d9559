#![cfg(feature = "web")]
//! HTTP API integration tests.
//!
//! Tests cover:
//! - Trade create/get/update/delete round trips through the router
//! - Close endpoint success, repeat-close conflict and unknown ids
//! - Status filtering and dashboard statistics payloads
//! - Error bodies and status codes for bad input and unknown routes

mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use tradejournal::adapters::memory_adapter::MemoryTradeStore;
use tradejournal::adapters::web::{AppState, build_router};

fn app_with(store: Arc<MemoryTradeStore>) -> Router {
    build_router(AppState::new(store))
}

fn app() -> Router {
    app_with(Arc::new(MemoryTradeStore::new()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn eurusd() -> Value {
    json!({
        "date": "2024-01-15",
        "pair": "EUR/USD",
        "type": "long",
        "entryPrice": 100,
        "quantity": "10",
        "fees": 5
    })
}

fn dec(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
async fn welcome_and_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Trading Journal API");

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Database connection successful!");
}

#[tokio::test]
async fn health_reports_storage_failure() {
    let store = Arc::new(MemoryTradeStore::new());
    store.set_unavailable(Some("connection refused"));
    let app = app_with(store);

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn create_returns_open_trade() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/trades", Some(eurusd())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["pair"], "EUR/USD");
    assert_eq!(body["direction"], "long");
    assert_eq!(body["status"], "open");
    assert!(body["exitPrice"].is_null());
    assert!(body["profitLoss"].is_null());
}

#[tokio::test]
async fn create_without_quantity_is_bad_request() {
    let app = app();
    let mut draft = eurusd();
    draft.as_object_mut().unwrap().remove("quantity");

    let (status, body) = send(&app, Method::POST, "/api/trades", Some(draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("quantity"));

    let (_, list) = send(&app, Method::GET, "/api/trades", None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/trades")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn close_computes_profit_loss_once() {
    let app = app();
    send(&app, Method::POST, "/api/trades", Some(eurusd())).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/trades/1/close",
        Some(json!({ "exitPrice": 120, "exitDate": "2024-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");
    assert_eq!(dec(&body["profitLoss"]), rust_decimal::Decimal::from(195));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/trades/1/close",
        Some(json!({ "exitPrice": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, stored) = send(&app, Method::GET, "/api/trades/1", None).await;
    assert_eq!(dec(&stored["exitPrice"]), rust_decimal::Decimal::from(120));
}

#[tokio::test]
async fn close_requires_exit_price() {
    let app = app();
    send(&app, Method::POST, "/api/trades", Some(eurusd())).await;

    let (status, body) = send(&app, Method::PUT, "/api/trades/1/close", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("exit_price"));
}

#[tokio::test]
async fn close_unknown_trade_is_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/trades/42/close",
        Some(json!({ "exitPrice": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = app();
    for _ in 0..3 {
        send(&app, Method::POST, "/api/trades", Some(eurusd())).await;
    }
    send(
        &app,
        Method::PUT,
        "/api/trades/2/close",
        Some(json!({ "exitPrice": 90 })),
    )
    .await;

    let (_, open) = send(&app, Method::GET, "/api/trades?status=open", None).await;
    let (_, closed) = send(&app, Method::GET, "/api/trades?status=closed", None).await;
    assert_eq!(open.as_array().unwrap().len(), 2);
    assert_eq!(closed.as_array().unwrap().len(), 1);
    assert_eq!(closed[0]["id"], 2);

    let (status, _) = send(&app, Method::GET, "/api/trades?status=pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_recomputes_closed_trade() {
    let app = app();
    send(&app, Method::POST, "/api/trades", Some(eurusd())).await;
    send(
        &app,
        Method::PUT,
        "/api/trades/1/close",
        Some(json!({ "exitPrice": 120 })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/trades/1",
        Some(json!({ "quantity": 5, "notes": "halved size" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["profitLoss"]), rust_decimal::Decimal::from(95));
    assert_eq!(body["notes"], "halved size");
}

#[tokio::test]
async fn update_clears_take_profit() {
    let app = app();
    let mut draft = eurusd();
    draft["takeProfit"] = json!(150);
    send(&app, Method::POST, "/api/trades", Some(draft)).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/trades/1",
        Some(json!({ "clearTakeProfit": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["takeProfit"].is_null());
}

#[tokio::test]
async fn close_with_out_of_range_exit_price_is_bad_request() {
    let app = app();
    let mut draft = eurusd();
    draft["entryPrice"] = json!(1);
    send(&app, Method::POST, "/api/trades", Some(draft)).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/trades/1/close",
        Some(json!({ "exitPrice": "79228162514264337593543950335" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stored) = send(&app, Method::GET, "/api/trades/1", None).await;
    assert_eq!(stored["status"], "open");
}

#[tokio::test]
async fn update_exit_on_open_trade_conflicts() {
    let app = app();
    send(&app, Method::POST, "/api/trades", Some(eurusd())).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/trades/1",
        Some(json!({ "exitPrice": 110 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app();
    send(&app, Method::POST, "/api/trades", Some(eurusd())).await;

    let (status, body) = send(&app, Method::DELETE, "/api/trades/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Trade deleted successfully");

    let (status, _) = send(&app, Method::GET, "/api/trades/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/api/trades/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/trades/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn stats_payload_matches_dashboard() {
    let app = app();
    for (pair, exit) in [("BTC/USD", Some(200)), ("ETH/USD", Some(60)), ("BTC/USD", None), ("SOL/USD", Some(120))] {
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/trades",
            Some(json!({
                "date": "2024-01-15",
                "pair": pair,
                "direction": "long",
                "entryPrice": 100,
                "quantity": 1
            })),
        )
        .await;
        if let Some(exit) = exit {
            let uri = format!("/api/trades/{}/close", created["id"]);
            send(&app, Method::PUT, &uri, Some(json!({ "exitPrice": exit }))).await;
        }
    }

    let (status, stats) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalTrades"], 4);
    assert_eq!(stats["totalClosedTrades"], 3);
    assert_eq!(dec(&stats["netProfit"]), rust_decimal::Decimal::from(80));
    assert_eq!(dec(&stats["profitFactor"]), rust_decimal::Decimal::from(3));
    assert_eq!(
        dec(&stats["percentProfitable"]).round_dp(2).to_string(),
        "66.67"
    );
    assert_eq!(stats["timeSeries"].as_array().unwrap().len(), 3);
    assert_eq!(stats["pairs"].as_array().unwrap().len(), 3);
}
