// Order placement and stock reconciliation
pub mod orders;

// Stock outside of orders
pub mod stock;

// Reporting
pub mod dashboard;

// Name lookups
pub mod catalog;
