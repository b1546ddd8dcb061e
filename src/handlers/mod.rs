pub mod common;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod parts;
pub mod products;
pub mod search;
pub mod stock;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::repositories::{CustomerRepository, PartRepository, ProductRepository};
use crate::services::{
    catalog::CatalogService, dashboard::DashboardService, orders::OrderService,
    stock::StockService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Repositories and services used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerRepository>,
    pub products: Arc<ProductRepository>,
    pub parts: Arc<PartRepository>,
    pub orders: Arc<OrderService>,
    pub stock: Arc<StockService>,
    pub dashboard: Arc<DashboardService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            customers: Arc::new(CustomerRepository::new(db_pool.clone())),
            products: Arc::new(ProductRepository::new(db_pool.clone())),
            parts: Arc::new(PartRepository::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.low_stock_threshold,
            )),
            stock: Arc::new(StockService::new(
                db_pool.clone(),
                event_sender,
                config.low_stock_threshold,
            )),
            dashboard: Arc::new(DashboardService::new(
                db_pool.clone(),
                config.dashboard_default_days,
                config.dashboard_max_range_days,
            )),
            catalog: Arc::new(CatalogService::new(db_pool)),
        }
    }
}
