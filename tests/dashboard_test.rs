mod common;

use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::str::FromStr;

use common::TestApp;

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal encoded as string")).expect("valid decimal")
}

async fn march_history(app: &TestApp) {
    let trinity = app.seed_customer("Trinity", true).await;
    let morpheus = app.seed_customer("Morpheus", true).await;
    app.seed_customer("Tank", true).await;
    let ship = app.seed_product("Nebuchadnezzar", dec!(10.25), 0).await;
    let pill = app.seed_product("Red pill", dec!(1.50), 0).await;

    app.seed_order_at(
        trinity.id,
        Utc.with_ymd_and_hms(2024, 2, 20, 9, 0, 0).unwrap(),
        &[(ship.id, 1)],
    )
    .await;
    app.seed_order_at(
        morpheus.id,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        &[(ship.id, 2), (pill.id, 1)],
    )
    .await;
    app.seed_order_at(
        trinity.id,
        Utc.with_ymd_and_hms(2024, 3, 3, 23, 59, 59).unwrap(),
        &[(pill.id, 4)],
    )
    .await;
    app.seed_order_at(
        morpheus.id,
        Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap(),
        &[(ship.id, 10)],
    )
    .await;
}

#[tokio::test]
async fn dashboard_totals_cover_the_requested_days() {
    let app = TestApp::new().await;
    march_history(&app).await;

    let body = app
        .call(
            Method::GET,
            "/api/v1/dashboard?start_date=2024-03-01&end_date=2024-03-05",
            None,
            StatusCode::OK,
        )
        .await;
    let stats = &body["data"];

    assert_eq!(stats["start_date"], "2024-03-01");
    assert_eq!(stats["end_date"], "2024-03-05");
    assert_eq!(stats["total_orders"], 2);
    assert_eq!(decimal(&stats["total_revenue"]), dec!(28.00));
    assert_eq!(stats["total_customers"], 3);
    // Trinity ordered before March, so only Morpheus is new.
    assert_eq!(stats["new_customers"], 1);
}

#[tokio::test]
async fn daily_series_have_one_entry_per_day() {
    let app = TestApp::new().await;
    march_history(&app).await;

    let body = app
        .call(
            Method::GET,
            "/api/v1/dashboard?start_date=2024-03-01&end_date=2024-03-05",
            None,
            StatusCode::OK,
        )
        .await;
    let stats = &body["data"];

    let counts: Vec<(String, u64)> = stats["daily_order_counts"]
        .as_array()
        .expect("daily counts")
        .iter()
        .map(|d| {
            (
                d["date"].as_str().unwrap_or_default().to_string(),
                d["count"].as_u64().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        counts,
        vec![
            ("2024-03-01".to_string(), 1),
            ("2024-03-02".to_string(), 0),
            ("2024-03-03".to_string(), 1),
            ("2024-03-04".to_string(), 0),
            ("2024-03-05".to_string(), 0),
        ]
    );

    let revenue: Vec<Decimal> = stats["daily_revenue"]
        .as_array()
        .expect("daily revenue")
        .iter()
        .map(|d| decimal(&d["revenue"]))
        .collect();
    assert_eq!(
        revenue,
        vec![dec!(22.00), dec!(0), dec!(6.00), dec!(0), dec!(0)]
    );
}

#[tokio::test]
async fn a_single_day_range_is_allowed() {
    let app = TestApp::new().await;
    march_history(&app).await;

    let body = app
        .call(
            Method::GET,
            "/api/v1/dashboard?start_date=2024-03-06&end_date=2024-03-06",
            None,
            StatusCode::OK,
        )
        .await;

    assert_eq!(body["data"]["total_orders"], 1);
    assert_eq!(decimal(&body["data"]["total_revenue"]), dec!(102.50));
    assert_eq!(
        body["data"]["daily_order_counts"]
            .as_array()
            .map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn an_empty_database_reports_zeroes_for_the_default_window() {
    let app = TestApp::new().await;

    let body = app
        .call(Method::GET, "/api/v1/dashboard", None, StatusCode::OK)
        .await;
    let stats = &body["data"];

    assert_eq!(stats["total_orders"], 0);
    assert_eq!(decimal(&stats["total_revenue"]), Decimal::ZERO);
    assert_eq!(stats["new_customers"], 0);
    // Default window: 30 days back from today, both ends included.
    assert_eq!(stats["daily_order_counts"].as_array().map(Vec::len), Some(31));
    assert_eq!(stats["daily_revenue"].as_array().map(Vec::len), Some(31));
}

#[tokio::test]
async fn invalid_ranges_are_rejected() {
    let app = TestApp::new().await;

    for query in [
        "start_date=2024-03-05&end_date=2024-03-01",
        "start_date=2022-01-01&end_date=2024-01-01",
        "start_date=yesterday",
        "end_date=-262143-01-05",
    ] {
        app.call(
            Method::GET,
            &format!("/api/v1/dashboard?{query}"),
            None,
            StatusCode::BAD_REQUEST,
        )
        .await;
    }
}
