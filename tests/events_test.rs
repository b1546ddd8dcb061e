mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use matrixinc_api::events::{Event, StockItemKind};

use common::TestApp;

async fn low_threshold_app() -> TestApp {
    TestApp::with_config(|cfg| cfg.low_stock_threshold = 5).await
}

#[tokio::test]
async fn order_lifecycle_raises_one_event_per_step() {
    let app = low_threshold_app().await;
    let neo = app.seed_customer("Neo", true).await;
    let ship = app.seed_product("Nebuchadnezzar", dec!(25.50), 10).await;

    let created = app
        .call(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": neo.id,
                "lines": [{ "product_id": ship.id, "quantity": 3 }]
            })),
            StatusCode::CREATED,
        )
        .await;
    let order_id = created["data"]["id"].as_i64().expect("order id") as i32;
    assert_eq!(
        app.take_events(),
        vec![Event::OrderCreated {
            order_id,
            customer_id: neo.id
        }]
    );

    app.call(
        Method::PUT,
        &format!("/api/v1/orders/{order_id}"),
        Some(json!({ "lines": [{ "product_id": ship.id, "quantity": 6 }] })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(
        app.take_events(),
        vec![
            Event::OrderUpdated { order_id },
            Event::LowStock {
                product_id: ship.id,
                remaining: 4
            },
        ]
    );

    app.call(
        Method::DELETE,
        &format!("/api/v1/orders/{order_id}"),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    assert_eq!(app.take_events(), vec![Event::OrderDeleted { order_id }]);
}

#[tokio::test]
async fn failed_orders_raise_nothing() {
    let app = low_threshold_app().await;
    let neo = app.seed_customer("Neo", true).await;
    let ship = app.seed_product("Logos", dec!(40), 2).await;

    app.call(
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "customer_id": neo.id,
            "lines": [{ "product_id": ship.id, "quantity": 3 }]
        })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    app.call(
        Method::DELETE,
        "/api/v1/orders/4242",
        None,
        StatusCode::NOT_FOUND,
    )
    .await;

    assert!(app.take_events().is_empty());
}

#[tokio::test]
async fn restocking_reports_every_item() {
    let app = low_threshold_app().await;
    let ship = app.seed_product("Nebuchadnezzar", dec!(100), 2).await;
    let hull = app.seed_part("Hull plate", dec!(8), 0).await;

    app.call(
        Method::POST,
        "/api/v1/stock/restock",
        Some(json!({
            "items": [
                { "kind": "part", "id": hull.id, "quantity": 5 },
                { "kind": "product", "id": ship.id, "quantity": 3 },
                { "kind": "part", "id": hull.id, "quantity": 2 }
            ],
            "reason": "weekly delivery"
        })),
        StatusCode::OK,
    )
    .await;

    assert_eq!(
        app.take_events(),
        vec![
            Event::StockReplenished {
                kind: StockItemKind::Product,
                item_id: ship.id,
                quantity: 3,
                new_stock: 5,
                reason: Some("weekly delivery".to_string()),
            },
            Event::StockReplenished {
                kind: StockItemKind::Part,
                item_id: hull.id,
                quantity: 7,
                new_stock: 7,
                reason: Some("weekly delivery".to_string()),
            },
        ]
    );
}

#[tokio::test]
async fn adjustments_warn_once_stock_reaches_the_threshold() {
    let app = low_threshold_app().await;
    let hammer = app.seed_product("Hammer", dec!(100), 8).await;
    let uri = format!("/api/v1/stock/products/{}/adjust", hammer.id);

    app.call(
        Method::POST,
        &uri,
        Some(json!({ "amount": -2 })),
        StatusCode::OK,
    )
    .await;
    assert!(app.take_events().is_empty(), "6 units is above the threshold");

    app.call(
        Method::POST,
        &uri,
        Some(json!({ "amount": -1 })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(
        app.take_events(),
        vec![Event::LowStock {
            product_id: hammer.id,
            remaining: 5
        }]
    );

    app.call(
        Method::POST,
        &uri,
        Some(json!({ "amount": 10, "reason": "found in storage" })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(
        app.take_events(),
        vec![Event::StockReplenished {
            kind: StockItemKind::Product,
            item_id: hammer.id,
            quantity: 10,
            new_stock: 15,
            reason: Some("found in storage".to_string()),
        }]
    );
}
