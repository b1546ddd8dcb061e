mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn customers_are_created_active_by_default() {
    let app = TestApp::new().await;

    let created = app
        .call(
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "name": " Trinity ", "address": "Club Hel 1" })),
            StatusCode::CREATED,
        )
        .await;

    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["name"], "Trinity");
    assert_eq!(created["data"]["active"], true);
}

#[tokio::test]
async fn customers_need_a_name_and_an_address() {
    let app = TestApp::new().await;

    app.call(
        Method::POST,
        "/api/v1/customers",
        Some(json!({ "name": "", "address": "Zion" })),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::POST,
        "/api/v1/customers",
        Some(json!({ "name": "Tank", "address": "  " })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn deactivated_customers_disappear_from_order_options() {
    let app = TestApp::new().await;
    let mouse = app.seed_customer("Mouse", true).await;
    app.seed_customer("Apoc", true).await;

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/v1/customers/{}", mouse.id),
            Some(json!({ "active": false })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["active"], false);
    assert_eq!(updated["data"]["name"], "Mouse");

    let options = app
        .call(Method::GET, "/api/v1/orders/options", None, StatusCode::OK)
        .await;
    let names: Vec<&str> = options["data"]["customers"]
        .as_array()
        .expect("customers")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Apoc"]);
}

#[tokio::test]
async fn a_customer_comes_with_their_orders() {
    let app = TestApp::new().await;
    let neo = app.seed_customer("Neo", true).await;
    let ship = app.seed_product("Nebuchadnezzar", dec!(10), 0).await;
    let first = app
        .seed_order_at(neo.id, chrono::Utc::now() - chrono::Duration::days(2), &[(ship.id, 1)])
        .await;
    let latest = app
        .seed_order_at(neo.id, chrono::Utc::now(), &[(ship.id, 1)])
        .await;

    let body = app
        .call(
            Method::GET,
            &format!("/api/v1/customers/{}", neo.id),
            None,
            StatusCode::OK,
        )
        .await;

    assert_eq!(body["data"]["name"], "Neo");
    let orders = body["data"]["orders"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], latest.id);
    assert_eq!(orders[1]["id"], first.id);
}

#[tokio::test]
async fn customers_with_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let neo = app.seed_customer("Neo", true).await;
    let smith = app.seed_customer("Smith", true).await;
    let ship = app.seed_product("Nebuchadnezzar", dec!(10), 0).await;
    app.seed_order_at(neo.id, chrono::Utc::now(), &[(ship.id, 1)])
        .await;

    app.call(
        Method::DELETE,
        &format!("/api/v1/customers/{}", neo.id),
        None,
        StatusCode::CONFLICT,
    )
    .await;
    app.call(
        Method::DELETE,
        &format!("/api/v1/customers/{}", smith.id),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    app.call(
        Method::GET,
        &format!("/api/v1/customers/{}", smith.id),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn customer_pages_are_clamped_to_the_maximum_size() {
    let app = TestApp::with_config(|cfg| cfg.api_max_page_size = 2).await;
    for name in ["Neo", "Trinity", "Morpheus"] {
        app.seed_customer(name, true).await;
    }

    let body = app
        .call(
            Method::GET,
            "/api/v1/customers?page=2&per_page=50",
            None,
            StatusCode::OK,
        )
        .await;

    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["page"], 2);
    assert_eq!(pagination["per_page"], 2);
    assert_eq!(pagination["total"], 3);
    assert_eq!(pagination["total_pages"], 2);
    let names: Vec<&str> = body["data"]["data"]
        .as_array()
        .expect("customers")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Morpheus"]);
}
