//! End-to-end API tests over the full router (no network, tower oneshot).

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use mesa_server::api;
use mesa_server::{Config, EventBus, ServerState};
use shared::Topic;

async fn test_state() -> ServerState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let config = Config::with_overrides("/tmp/mesa-test", 0);
    ServerState::with_parts(config, pool, Arc::new(EventBus::new()))
}

async fn test_app() -> (Router, ServerState) {
    let state = test_state().await;
    (api::build_app(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
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

async fn seed_table(app: &Router, number: i32) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/tables",
        Some(json!({"number": number, "seats": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().unwrap()
}

async fn seed_menu_item(app: &Router, name: &str, price: f64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/menu",
        Some(json!({"name": name, "price": price, "category": "drinks"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn full_dining_flow() {
    let (app, state) = test_app().await;
    let table_id = seed_table(&app, 1).await;
    let tea = seed_menu_item(&app, "Tea", 3.0).await;
    let noodles = seed_menu_item(&app, "Noodles", 12.5).await;

    let mut rx = state.events.subscribe();

    // Customer submits a cart
    let (status, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "tableId": table_id,
            "items": [
                {"menuItemId": tea, "quantity": 2},
                {"menuItemId": noodles, "quantity": 1, "note": "no onions"}
            ],
            "customerName": "Ana"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalAmount"].as_f64().unwrap(), 18.5);
    assert_eq!(order["status"], "new");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    let order_id = order["id"].as_i64().unwrap();

    // Dashboard saw the order land
    let ev = rx.recv().await.unwrap();
    assert_eq!(ev.topic, Topic::Dashboard);
    assert_eq!(ev.event.name(), "newOrder");

    // Table is now occupied
    let (_, table) = send(&app, "GET", &format!("/api/tables/{table_id}"), None).await;
    assert_eq!(table["status"], "occupied");

    // Kitchen advances the order
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(json!({"status": "preparing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "preparing");

    // Customer calls for the bill: preview only, nothing written
    let (status, preview) = send(
        &app,
        "PATCH",
        &format!("/api/tables/{table_id}/callStaff"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["orderCount"], 1);
    assert_eq!(preview["totalAmount"].as_f64().unwrap(), 18.5);
    let (_, bills) = send(&app, "GET", "/api/bills", None).await;
    assert!(bills.as_array().unwrap().is_empty());

    // Staff checks the table out
    let (status, summary) = send(
        &app,
        "PATCH",
        &format!("/api/tables/{table_id}/checkout"),
        Some(json!({"paymentMethod": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["bill"]["totalAmount"].as_f64().unwrap(), 18.5);
    assert_eq!(summary["bill"]["paymentMethod"], "cash");
    assert_eq!(summary["ordersBilled"], 1);
    assert_eq!(summary["table"]["status"], "available");
    let bill_id = summary["bill"]["id"].as_i64().unwrap();

    // Order is served, bill resolves its orders
    let (_, order) = send(&app, "GET", &format!("/api/orders/{order_id}"), None).await;
    assert_eq!(order["status"], "served");
    let (status, bill) = send(&app, "GET", &format!("/api/bills/{bill_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bill["orders"].as_array().unwrap().len(), 1);
    assert_eq!(bill["orders"][0]["id"].as_i64().unwrap(), order_id);
}

#[tokio::test]
async fn create_order_failures_roll_back() {
    let (app, _) = test_app().await;
    let table_id = seed_table(&app, 2).await;
    let tea = seed_menu_item(&app, "Tea", 3.0).await;

    // Empty cart
    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");

    // Unknown menu item aborts the whole order
    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "tableId": table_id,
            "items": [
                {"menuItemId": tea, "quantity": 1},
                {"menuItemId": 9999, "quantity": 1}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");

    let (_, orders) = send(&app, "GET", "/api/orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
    let (_, table) = send(&app, "GET", &format!("/api/tables/{table_id}"), None).await;
    assert_eq!(table["status"], "available");
}

#[tokio::test]
async fn order_update_errors() {
    let (app, _) = test_app().await;
    let table_id = seed_table(&app, 3).await;
    let tea = seed_menu_item(&app, "Tea", 3.0).await;
    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": [{"menuItemId": tea, "quantity": 1}]})),
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();

    // Neither status nor note
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0006");

    // Illegal transition
    send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(json!({"status": "ready"})),
    )
    .await;
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/orders/{order_id}"),
        Some(json!({"status": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown order
    let (status, _) = send(
        &app,
        "PATCH",
        "/api/orders/12345",
        Some(json!({"status": "ready"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_errors() {
    let (app, _) = test_app().await;
    let table_id = seed_table(&app, 4).await;

    // Unknown table
    let (status, _) = send(
        &app,
        "PATCH",
        "/api/tables/777/checkout",
        Some(json!({"paymentMethod": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing to bill
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tables/{table_id}/checkout"),
        Some(json!({"paymentMethod": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");

    // Unsupported payment method
    let tea = seed_menu_item(&app, "Tea", 3.0).await;
    send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": [{"menuItemId": tea, "quantity": 1}]})),
    )
    .await;
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tables/{table_id}/checkout"),
        Some(json!({"paymentMethod": "transfer"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0006");
}

#[tokio::test]
async fn clear_marker_resets_the_table_without_billing() {
    let (app, _) = test_app().await;
    let table_id = seed_table(&app, 5).await;
    let tea = seed_menu_item(&app, "Tea", 3.0).await;
    send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": [{"menuItemId": tea, "quantity": 1}]})),
    )
    .await;

    let (status, table) = send(
        &app,
        "POST",
        &format!("/api/tables/{table_id}/checkout"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["status"], "available");

    let (_, bills) = send(&app, "GET", "/api/bills", None).await;
    assert!(bills.as_array().unwrap().is_empty());

    // The old orders fell out of the billing window
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/tables/{table_id}/checkout"),
        Some(json!({"paymentMethod": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn menu_soft_delete_keeps_history() {
    let (app, _) = test_app().await;
    let table_id = seed_table(&app, 6).await;
    let tea = seed_menu_item(&app, "Tea", 3.0).await;
    let (_, order) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": [{"menuItemId": tea, "quantity": 1}]})),
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/api/menu/{tea}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // Catalog row still resolvable, just unavailable
    let (status, item) = send(&app, "GET", &format!("/api/menu/{tea}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["isAvailable"], false);

    // Existing order kept its snapshot, new orders are rejected
    let (_, order) = send(&app, "GET", &format!("/api/orders/{order_id}"), None).await;
    assert_eq!(order["items"][0]["price"].as_f64().unwrap(), 3.0);
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({"tableId": table_id, "items": [{"menuItemId": tea, "quantity": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_table_number_conflicts() {
    let (app, _) = test_app().await;
    seed_table(&app, 7).await;
    let (status, body) = send(&app, "POST", "/api/tables", Some(json!({"number": 7}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");
}

#[tokio::test]
async fn events_endpoint_rejects_unknown_topics() {
    let (app, _) = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/events?topic=kitchen")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn state_initializes_on_disk_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    let state = ServerState::initialize(&config).await.unwrap();
    assert!(config.db_path().exists());

    let app = api::build_app(state);
    let (status, tables) = send(&app, "GET", "/api/tables", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(tables.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_ok_with_request_id() {
    let (app, _) = test_app().await;
    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}
