//! Demo data for an empty database: the crew of the Nebuchadnezzar, the ship's
//! catalog and a month of random order history.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set};
use serde::Serialize;
use tracing::{info, instrument};

use super::{begin_transaction, commit_transaction, DbPool};
use crate::entities::{customer, order, order_product, part, product};
use crate::errors::ServiceError;

/// Days of order history generated, counted back from today (inclusive).
pub const HISTORY_DAYS: i64 = 30;

const CUSTOMERS: [(&str, &str); 4] = [
    ("Neo", "123 Elm St"),
    ("Morpheus", "456 Oak St"),
    ("Trinity", "789 Pine St"),
    ("Admin", "Admin Street 1"),
];

struct CatalogItem {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    stock: i32,
}

fn products() -> [CatalogItem; 3] {
    [
        CatalogItem {
            name: "Nebuchadnezzar",
            description: "Het schip waarop Neo voor het eerst de echte wereld leert kennen",
            price: dec!(10000.00),
            stock: 2,
        },
        CatalogItem {
            name: "Jack-in Chair",
            description: "Stoel met een rugsteun en metalen armen waarin mensen zitten om ingeplugd te worden in de Matrix via een kabel in de nekpoort",
            price: dec!(500.50),
            stock: 15,
        },
        CatalogItem {
            name: "EMP (Electro-Magnetic Pulse) Device",
            description: "Wapentuig op de schepen van Zion",
            price: dec!(129.99),
            stock: 8,
        },
    ]
}

fn parts() -> [CatalogItem; 4] {
    [
        CatalogItem {
            name: "Tandwiel",
            description: "Overdracht van rotatie in bijvoorbeeld de motor of luikmechanismen",
            price: dec!(15.50),
            stock: 100,
        },
        CatalogItem {
            name: "M5 Boutje",
            description: "Bevestiging van panelen, buizen of interne modules",
            price: dec!(0.25),
            stock: 500,
        },
        CatalogItem {
            name: "Hydraulische cilinder",
            description: "Openen/sluiten van zware luchtsluizen of bewegende onderdelen",
            price: dec!(89.99),
            stock: 25,
        },
        CatalogItem {
            name: "Koelvloeistofpomp",
            description: "Koeling van de motor of elektronische systemen",
            price: dec!(156.75),
            stock: 12,
        },
    ]
}

/// What [`initialize`] inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub skipped: bool,
    pub customers: usize,
    pub products: usize,
    pub parts: usize,
    pub orders: usize,
}

/// An order to be generated, before ids are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOrder {
    pub order_date: DateTime<Utc>,
    pub customer_index: usize,
    /// product index -> quantity
    pub lines: BTreeMap<usize, i32>,
}

/// Plans 0-3 orders for every day of the history window, each with 1-3 lines of
/// 1-3 units. Picking the same product twice adds to its quantity.
pub fn plan_orders<R: Rng>(
    rng: &mut R,
    now: DateTime<Utc>,
    customer_count: usize,
    product_count: usize,
) -> Vec<PlannedOrder> {
    let mut planned = Vec::new();
    if customer_count == 0 || product_count == 0 {
        return planned;
    }

    for days_ago in (0..=HISTORY_DAYS).rev() {
        let order_date = now - Duration::days(days_ago);
        for _ in 0..rng.gen_range(0..4) {
            let mut lines = BTreeMap::new();
            for _ in 0..rng.gen_range(1..4) {
                let product_index = rng.gen_range(0..product_count);
                *lines.entry(product_index).or_insert(0) += rng.gen_range(1..4);
            }
            planned.push(PlannedOrder {
                order_date,
                customer_index: rng.gen_range(0..customer_count),
                lines,
            });
        }
    }

    planned
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    item: &CatalogItem,
) -> Result<product::Model, ServiceError> {
    let model = product::ActiveModel {
        name: Set(item.name.to_string()),
        description: Set(item.description.to_string()),
        price: Set(item.price),
        stock: Set(item.stock),
        image: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

/// Seeds the database unless it already contains customers.
///
/// Generated orders do not touch stock levels.
#[instrument(skip(db))]
pub async fn initialize(db: &DbPool) -> Result<SeedSummary, ServiceError> {
    if customer::Entity::find().count(db).await? > 0 {
        info!("Database already contains customers; skipping demo data");
        return Ok(SeedSummary {
            skipped: true,
            ..Default::default()
        });
    }

    let started = Instant::now();
    let txn = begin_transaction(db, "seed").await?;

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, address) in CUSTOMERS {
        let model = customer::ActiveModel {
            name: Set(name.to_string()),
            address: Set(address.to_string()),
            active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        customer_ids.push(model.id);
    }

    let mut product_ids = Vec::new();
    for item in products().iter() {
        product_ids.push(insert_item(&txn, item).await?.id);
    }

    let part_models: Vec<part::ActiveModel> = parts()
        .iter()
        .map(|item| part::ActiveModel {
            name: Set(item.name.to_string()),
            description: Set(item.description.to_string()),
            price: Set(item.price),
            stock: Set(item.stock),
            image: Set(None),
            ..Default::default()
        })
        .collect();
    let part_count = part_models.len();
    part::Entity::insert_many(part_models)
        .exec_without_returning(&txn)
        .await?;

    let plan = plan_orders(
        &mut rand::thread_rng(),
        Utc::now(),
        customer_ids.len(),
        product_ids.len(),
    );
    for planned in &plan {
        let created = order::ActiveModel {
            order_date: Set(planned.order_date),
            customer_id: Set(customer_ids[planned.customer_index]),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let lines = planned
            .lines
            .iter()
            .map(|(&product_index, &quantity)| order_product::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(product_ids[product_index]),
                quantity: Set(quantity),
            });
        order_product::Entity::insert_many(lines)
            .exec_without_returning(&txn)
            .await?;
    }

    commit_transaction(txn, "seed", started).await?;

    let summary = SeedSummary {
        skipped: false,
        customers: customer_ids.len(),
        products: product_ids.len(),
        parts: part_count,
        orders: plan.len(),
    };
    info!(
        customers = summary.customers,
        products = summary.products,
        parts = summary.parts,
        orders = summary.orders,
        "Demo data inserted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn planned_orders_stay_within_bounds() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let plan = plan_orders(&mut rng, now, 4, 3);

        assert!(plan.len() <= 3 * (HISTORY_DAYS as usize + 1));
        for order in &plan {
            assert!(order.customer_index < 4);
            assert!(!order.lines.is_empty() && order.lines.len() <= 3);
            for (&product, &quantity) in &order.lines {
                assert!(product < 3);
                assert!((1..=9).contains(&quantity));
            }
            let age = now - order.order_date;
            assert!(age >= Duration::zero() && age <= Duration::days(HISTORY_DAYS));
        }
        assert!(plan.windows(2).all(|w| w[0].order_date <= w[1].order_date));
    }

    #[test]
    fn nothing_is_planned_without_customers_or_products() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_orders(&mut rng, Utc::now(), 0, 3).is_empty());
        assert!(plan_orders(&mut rng, Utc::now(), 4, 0).is_empty());
    }

    #[test]
    fn demo_catalog_matches_expected_stock() {
        let stock: i32 = products().iter().map(|p| p.stock).sum();
        assert_eq!(stock, 25);
        assert_eq!(parts().len(), 4);
    }
}
