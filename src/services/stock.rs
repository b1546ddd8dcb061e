use sea_orm::{DatabaseTransaction, EntityTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{begin_transaction, commit_transaction, rollback_transaction, DbPool};
use crate::entities::{part, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender, StockItemKind};
use crate::repositories::part_repository::PartWithProducts;
use crate::repositories::product_repository::ProductWithParts;
use crate::repositories::{PartRepository, ProductRepository};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RestockItem {
    pub kind: StockItemKind,
    pub id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RestockRequest {
    #[validate(length(max = 200))]
    pub items: Vec<RestockItem>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentRequest {
    /// Signed change; negative values take stock out.
    pub amount: i32,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Stock level of one item after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockLevel {
    pub kind: StockItemKind,
    pub id: i32,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockOverview {
    pub products: Vec<ProductWithParts>,
    pub parts: Vec<PartWithProducts>,
}

/// Drops non-positive quantities and merges repeated items.
pub fn normalize_restock(
    items: &[RestockItem],
) -> Result<BTreeMap<(StockItemKind, i32), i32>, ServiceError> {
    let mut merged = BTreeMap::new();
    for item in items.iter().filter(|i| i.quantity > 0) {
        let quantity: &mut i32 = merged.entry((item.kind, item.id)).or_insert(0);
        *quantity = quantity.checked_add(item.quantity).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Quantity for {} {} is too large",
                item.kind, item.id
            ))
        })?;
    }
    if merged.is_empty() {
        return Err(ServiceError::ValidationError(
            "Restocking needs at least one item with a positive quantity".to_string(),
        ));
    }
    Ok(merged)
}

/// Service for replenishing and correcting stock outside of customer orders
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    products: ProductRepository,
    parts: PartRepository,
    low_stock_threshold: i32,
}

impl StockService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            products: ProductRepository::new(db_pool.clone()),
            parts: PartRepository::new(db_pool.clone()),
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    /// Adds stock to products and parts in one transaction.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn restock(&self, request: RestockRequest) -> Result<Vec<StockLevel>, ServiceError> {
        request.validate()?;
        let items = normalize_restock(&request.items)?;

        let started = Instant::now();
        let txn = begin_transaction(&self.db_pool, "restock").await?;
        let result = async {
            let mut levels = Vec::with_capacity(items.len());
            for (&(kind, id), &quantity) in &items {
                levels.push(replenish(&txn, kind, id, quantity).await?);
            }
            Ok::<_, ServiceError>(levels)
        }
        .await;

        let levels = match result {
            Ok(levels) => levels,
            Err(e) => {
                rollback_transaction(txn, "restock", &e).await;
                return Err(e);
            }
        };
        commit_transaction(txn, "restock", started).await?;

        for level in &levels {
            let quantity = items.get(&(level.kind, level.id)).copied().unwrap_or_default();
            info!(
                kind = %level.kind,
                id = level.id,
                quantity,
                stock = level.stock,
                "Stock replenished"
            );
            self.event_sender
                .send_or_log(Event::StockReplenished {
                    kind: level.kind,
                    item_id: level.id,
                    quantity,
                    new_stock: level.stock,
                    reason: request.reason.clone(),
                })
                .await;
        }
        Ok(levels)
    }

    /// Applies a signed correction to a product's stock; it may not go below zero.
    #[instrument(skip(self, request), fields(amount = request.amount))]
    pub async fn adjust_product_stock(
        &self,
        product_id: i32,
        request: StockAdjustmentRequest,
    ) -> Result<StockLevel, ServiceError> {
        request.validate()?;
        if request.amount == 0 {
            return Err(ServiceError::ValidationError(
                "Adjustment amount must not be zero".to_string(),
            ));
        }

        let started = Instant::now();
        let txn = begin_transaction(&self.db_pool, "adjust_stock").await?;
        let result = adjust(&txn, product_id, request.amount).await;

        let level = match result {
            Ok(level) => level,
            Err(e) => {
                rollback_transaction(txn, "adjust_stock", &e).await;
                return Err(e);
            }
        };
        commit_transaction(txn, "adjust_stock", started).await?;

        info!(
            product_id,
            amount = request.amount,
            stock = level.stock,
            reason = request.reason.as_deref().unwrap_or("-"),
            "Product stock adjusted"
        );
        if request.amount > 0 {
            self.event_sender
                .send_or_log(Event::StockReplenished {
                    kind: StockItemKind::Product,
                    item_id: product_id,
                    quantity: request.amount,
                    new_stock: level.stock,
                    reason: request.reason.clone(),
                })
                .await;
        }
        if level.stock <= self.low_stock_threshold {
            warn!(product_id, stock = level.stock, "Product stock at or below threshold");
            self.event_sender
                .send_or_log(Event::LowStock {
                    product_id,
                    remaining: level.stock,
                })
                .await;
        }
        Ok(level)
    }

    pub async fn stock_overview(&self) -> Result<StockOverview, ServiceError> {
        Ok(StockOverview {
            products: self.products.get_all_products().await?,
            parts: self.parts.get_all_parts().await?,
        })
    }
}

async fn replenish(
    txn: &DatabaseTransaction,
    kind: StockItemKind,
    id: i32,
    quantity: i32,
) -> Result<StockLevel, ServiceError> {
    let (name, stock) = match kind {
        StockItemKind::Product => {
            let found = product::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
            (found.name, found.stock)
        }
        StockItemKind::Part => {
            let found = part::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", id)))?;
            (found.name, found.stock)
        }
    };

    let new_stock = stock.checked_add(quantity).ok_or_else(|| {
        ServiceError::ValidationError(format!("Stock of {} {} would overflow", kind, id))
    })?;

    let applied = match kind {
        StockItemKind::Product => ProductRepository::increment_stock(txn, id, quantity).await?,
        StockItemKind::Part => PartRepository::increment_stock(txn, id, quantity).await?,
    };
    if !applied {
        return Err(ServiceError::ValidationError(format!(
            "Stock of {} {} would overflow",
            kind, id
        )));
    }

    Ok(StockLevel {
        kind,
        id,
        name,
        stock: new_stock,
    })
}

async fn adjust(
    txn: &DatabaseTransaction,
    product_id: i32,
    amount: i32,
) -> Result<StockLevel, ServiceError> {
    let found = product::Entity::find_by_id(product_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    let new_stock = found.stock.checked_add(amount).ok_or_else(|| {
        ServiceError::ValidationError(format!("Stock of product {} would overflow", product_id))
    })?;
    if new_stock < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "{} (requested {}, available {})",
            found.name,
            amount.unsigned_abs(),
            found.stock
        )));
    }

    let applied = if amount > 0 {
        ProductRepository::increment_stock(txn, product_id, amount).await?
    } else {
        ProductRepository::try_decrement_stock(txn, product_id, -amount).await?
    };
    if !applied {
        return Err(ServiceError::InsufficientStock(format!(
            "{} (requested {}, available {})",
            found.name,
            amount.unsigned_abs(),
            found.stock
        )));
    }

    Ok(StockLevel {
        kind: StockItemKind::Product,
        id: product_id,
        name: found.name,
        stock: new_stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn item(kind: StockItemKind, id: i32, quantity: i32) -> RestockItem {
        RestockItem { kind, id, quantity }
    }

    #[test]
    fn restock_items_are_merged_per_kind_and_id() {
        let merged = normalize_restock(&[
            item(StockItemKind::Product, 1, 5),
            item(StockItemKind::Part, 1, 2),
            item(StockItemKind::Product, 1, 1),
            item(StockItemKind::Part, 3, 0),
        ])
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&(StockItemKind::Product, 1)], 6);
        assert_eq!(merged[&(StockItemKind::Part, 1)], 2);
    }

    #[test]
    fn restock_without_positive_quantities_is_rejected() {
        assert_matches!(
            normalize_restock(&[item(StockItemKind::Part, 2, -3)]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn restock_kind_uses_lowercase_names() {
        let parsed: RestockItem =
            serde_json::from_str(r#"{"kind":"part","id":4,"quantity":10}"#).unwrap();
        assert_eq!(parsed.kind, StockItemKind::Part);
    }
}
