mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{EntityTrait, PaginatorTrait};

use matrixinc_api::db;
use matrixinc_api::entities::{customer, order, part, product};

use common::TestApp;

#[tokio::test]
async fn health_endpoints_report_up() {
    let app = TestApp::new().await;

    let health = app.call(Method::GET, "/health", None, StatusCode::OK).await;
    assert_eq!(health["status"], "up");

    let live = app
        .call(Method::GET, "/health/live", None, StatusCode::OK)
        .await;
    assert_eq!(live["alive"], true);

    let ready = app
        .call(Method::GET, "/health/ready", None, StatusCode::OK)
        .await;
    assert_eq!(ready["ready"], true);
    assert_eq!(ready["details"]["database"]["status"], "up");

    let version = app
        .call(Method::GET, "/health/version", None, StatusCode::OK)
        .await;
    assert_eq!(version["name"], "matrixinc-api");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/robots", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seeding_fills_an_empty_database_once() {
    let app = TestApp::new().await;

    let summary = db::seed::initialize(app.db()).await.expect("seed");
    assert!(!summary.skipped);
    assert_eq!(summary.customers, 4);
    assert_eq!(summary.products, 3);
    assert_eq!(summary.parts, 4);

    assert_eq!(customer::Entity::find().count(app.db()).await.unwrap(), 4);
    assert_eq!(product::Entity::find().count(app.db()).await.unwrap(), 3);
    assert_eq!(part::Entity::find().count(app.db()).await.unwrap(), 4);
    assert_eq!(
        order::Entity::find().count(app.db()).await.unwrap(),
        summary.orders as u64
    );

    let again = db::seed::initialize(app.db()).await.expect("second seed");
    assert!(again.skipped);
    assert_eq!(customer::Entity::find().count(app.db()).await.unwrap(), 4);
}

#[tokio::test]
async fn seeded_history_shows_up_on_the_dashboard() {
    let app = TestApp::new().await;
    let summary = db::seed::initialize(app.db()).await.expect("seed");

    let body = app
        .call(Method::GET, "/api/v1/dashboard", None, StatusCode::OK)
        .await;
    let stats = &body["data"];

    assert_eq!(stats["total_customers"], 4);
    let daily_total: u64 = stats["daily_order_counts"]
        .as_array()
        .expect("daily counts")
        .iter()
        .filter_map(|d| d["count"].as_u64())
        .sum();
    assert_eq!(daily_total, stats["total_orders"].as_u64().unwrap_or_default());
    assert!(daily_total <= summary.orders as u64);
}
