#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use matrixinc_api::{
    config::AppConfig,
    db,
    entities::{customer, order, order_product, part, product},
    events::{Event, EventSender},
    AppState,
};

/// Application backed by a private in-memory SQLite database. Domain events are
/// kept on the channel so tests can inspect them.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    events: Mutex<mpsc::Receiver<Event>>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the application after letting the caller tweak the configuration.
    pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        configure(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = Arc::new(EventSender::new(event_tx));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = matrixinc_api::app_routes().with_state(state.clone());

        Self {
            router,
            state,
            events: Mutex::new(event_rx),
        }
    }

    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        self.state.db.as_ref()
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request, asserts the status and returns the parsed body
    /// (`Value::Null` for empty bodies).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body).await;
        let status = response.status();
        let json = read_json(response).await;
        assert_eq!(status, expected, "{method} {uri} answered {json}");
        json
    }

    pub async fn seed_customer(&self, name: &str, active: bool) -> customer::Model {
        customer::ActiveModel {
            name: Set(name.to_string()),
            address: Set(format!("{name} street 1")),
            active: Set(active),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed customer")
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("{name} description")),
            price: Set(price),
            stock: Set(stock),
            image: Set(None),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed product")
    }

    pub async fn seed_part(&self, name: &str, price: Decimal, stock: i32) -> part::Model {
        part::ActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("{name} description")),
            price: Set(price),
            stock: Set(stock),
            image: Set(None),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed part")
    }

    /// Inserts an order with a fixed date, bypassing stock bookkeeping.
    pub async fn seed_order_at(
        &self,
        customer_id: i32,
        order_date: DateTime<Utc>,
        lines: &[(i32, i32)],
    ) -> order::Model {
        let created = order::ActiveModel {
            customer_id: Set(customer_id),
            order_date: Set(order_date),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed order");

        for &(product_id, quantity) in lines {
            order_product::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
            }
            .insert(self.db())
            .await
            .expect("seed order line");
        }
        created
    }

    /// Drains the events raised since the previous call, oldest first.
    pub fn take_events(&self) -> Vec<Event> {
        let mut rx = self.events.lock().expect("event receiver lock");
        let mut taken = Vec::new();
        while let Ok(event) = rx.try_recv() {
            taken.push(event);
        }
        taken
    }

    pub async fn product_stock(&self, id: i32) -> i32 {
        product::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("query product")
            .expect("product exists")
            .stock
    }

    pub async fn part_stock(&self, id: i32) -> i32 {
        part::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("query part")
            .expect("part exists")
            .stock
    }
}


pub async fn read_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}
