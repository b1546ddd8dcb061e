use crate::{
    db::{begin_transaction, commit_transaction, rollback_transaction, DbPool},
    entities::{customer, order, order_product, product},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{CustomerRepository, OrderRepository, ProductRepository},
    repositories::order_repository::OrderDetails,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// A requested order line. Non-positive quantities are dropped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: i32,
    #[validate(length(max = 100, message = "An order holds at most 100 lines"))]
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EditOrderRequest {
    #[validate(length(max = 100, message = "An order holds at most 100 lines"))]
    pub lines: Vec<OrderLineRequest>,
}

/// What the order entry form can offer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderFormOptions {
    pub products: Vec<product::Model>,
    pub customers: Vec<customer::Model>,
}

/// Drops lines with a non-positive quantity and merges lines for the same product.
/// Fails when nothing orderable remains.
pub fn normalize_lines(lines: &[OrderLineRequest]) -> Result<BTreeMap<i32, i32>, ServiceError> {
    let mut merged: BTreeMap<i32, i32> = BTreeMap::new();
    for line in lines.iter().filter(|l| l.quantity > 0) {
        let quantity = merged.entry(line.product_id).or_insert(0);
        *quantity = quantity.checked_add(line.quantity).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Quantity for product {} is too large",
                line.product_id
            ))
        })?;
    }

    if merged.is_empty() {
        return Err(ServiceError::ValidationError(
            "An order needs at least one product with a positive quantity".to_string(),
        ));
    }
    Ok(merged)
}

/// Service for placing, editing and cancelling orders while keeping product stock in step
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    orders: OrderRepository,
    customers: CustomerRepository,
    products: ProductRepository,
    low_stock_threshold: i32,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            orders: OrderRepository::new(db_pool.clone()),
            customers: CustomerRepository::new(db_pool.clone()),
            products: ProductRepository::new(db_pool.clone()),
            db_pool,
            event_sender,
            low_stock_threshold,
        }
    }

    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderDetails>, u64), ServiceError> {
        self.orders.get_all_orders(page, per_page).await
    }

    pub async fn get_order(&self, order_id: i32) -> Result<OrderDetails, ServiceError> {
        self.orders
            .get_order_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Places an order and takes the ordered quantities out of stock, all or nothing.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let lines = normalize_lines(&request.lines)?;

        let started = Instant::now();
        let txn = begin_transaction(&self.db_pool, "create_order").await?;
        let result = async {
            let customer = customer::Entity::find_by_id(request.customer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
                })?;
            if !customer.active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Customer {} is inactive",
                    customer.id
                )));
            }

            let created = order::ActiveModel {
                customer_id: Set(customer.id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let remaining = apply_lines(&txn, created.id, &lines).await?;
            Ok((created, remaining))
        }
        .await;

        let (created, remaining) = match result {
            Ok(value) => value,
            Err(e) => {
                rollback_transaction(txn, "create_order", &e).await;
                return Err(e);
            }
        };
        commit_transaction(txn, "create_order", started).await?;

        info!(order_id = created.id, lines = lines.len(), "Order created");
        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id: created.id,
                customer_id: created.customer_id,
            })
            .await;
        self.report_low_stock(&remaining).await;

        self.get_order(created.id).await
    }

    /// Replaces the lines of an order. Stock of the old lines is returned before the
    /// new lines are taken out, so an edit may reuse the units it already held.
    #[instrument(skip(self, request))]
    pub async fn edit_order(
        &self,
        order_id: i32,
        request: EditOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let lines = normalize_lines(&request.lines)?;

        let started = Instant::now();
        let txn = begin_transaction(&self.db_pool, "edit_order").await?;
        let result = async {
            find_order(&txn, order_id).await?;
            restore_lines(&txn, order_id).await?;
            apply_lines(&txn, order_id, &lines).await
        }
        .await;

        let remaining = match result {
            Ok(value) => value,
            Err(e) => {
                rollback_transaction(txn, "edit_order", &e).await;
                return Err(e);
            }
        };
        commit_transaction(txn, "edit_order", started).await?;

        info!(order_id, lines = lines.len(), "Order updated");
        self.event_sender
            .send_or_log(Event::OrderUpdated { order_id })
            .await;
        self.report_low_stock(&remaining).await;

        self.get_order(order_id).await
    }

    /// Cancels an order, putting its quantities back into stock.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let started = Instant::now();
        let txn = begin_transaction(&self.db_pool, "delete_order").await?;
        let result = async {
            find_order(&txn, order_id).await?;
            restore_lines(&txn, order_id).await?;
            order::Entity::delete_by_id(order_id).exec(&txn).await?;
            Ok::<_, ServiceError>(())
        }
        .await;

        if let Err(e) = result {
            rollback_transaction(txn, "delete_order", &e).await;
            return Err(e);
        }
        commit_transaction(txn, "delete_order", started).await?;

        info!(order_id, "Order deleted");
        self.event_sender
            .send_or_log(Event::OrderDeleted { order_id })
            .await;
        Ok(())
    }

    pub async fn order_form_options(&self) -> Result<OrderFormOptions, ServiceError> {
        Ok(OrderFormOptions {
            products: self.products.get_products_in_stock().await?,
            customers: self.customers.get_active_customers().await?,
        })
    }

    async fn report_low_stock(&self, remaining: &[(i32, i32)]) {
        for &(product_id, stock) in remaining {
            if stock <= self.low_stock_threshold {
                warn!(product_id, stock, "Product stock at or below threshold");
                self.event_sender
                    .send_or_log(Event::LowStock {
                        product_id,
                        remaining: stock,
                    })
                    .await;
            }
        }
    }
}

async fn find_order(
    txn: &DatabaseTransaction,
    order_id: i32,
) -> Result<order::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

/// Takes every line out of stock and records it on the order.
/// Returns the stock left for each product.
async fn apply_lines(
    txn: &DatabaseTransaction,
    order_id: i32,
    lines: &BTreeMap<i32, i32>,
) -> Result<Vec<(i32, i32)>, ServiceError> {
    let mut remaining = Vec::with_capacity(lines.len());

    for (&product_id, &quantity) in lines {
        let product = product::Entity::find_by_id(product_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if !ProductRepository::try_decrement_stock(txn, product_id, quantity).await? {
            return Err(ServiceError::InsufficientStock(format!(
                "{} (requested {}, available {})",
                product.name, quantity, product.stock
            )));
        }
        remaining.push((product_id, product.stock - quantity));
    }

    let rows = lines
        .iter()
        .map(|(&product_id, &quantity)| order_product::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
        });
    order_product::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await?;

    Ok(remaining)
}

/// Returns the quantities of an order's lines to stock and removes the lines.
async fn restore_lines(txn: &DatabaseTransaction, order_id: i32) -> Result<(), ServiceError> {
    let existing = order_product::Entity::find()
        .filter(order_product::Column::OrderId.eq(order_id))
        .all(txn)
        .await?;

    for line in &existing {
        let product = product::Entity::find_by_id(line.product_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Product {} of order {} is missing",
                    line.product_id, order_id
                ))
            })?;
        let restored = product.stock.checked_add(line.quantity);
        if restored.is_none()
            || !ProductRepository::increment_stock(txn, line.product_id, line.quantity).await?
        {
            return Err(ServiceError::Conflict(format!(
                "Returning {} units of {} would overflow its stock of {}",
                line.quantity, product.name, product.stock
            )));
        }
    }

    order_product::Entity::delete_many()
        .filter(order_product::Column::OrderId.eq(order_id))
        .exec(txn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn line(product_id: i32, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn duplicate_products_are_summed() {
        let lines = normalize_lines(&[line(1, 2), line(2, 1), line(1, 3)]).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![(1, 5), (2, 1)]);
    }

    #[test]
    fn non_positive_quantities_are_dropped() {
        let lines = normalize_lines(&[line(1, 0), line(2, -4), line(3, 1)]).unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![(3, 1)]);
    }

    #[test]
    fn an_order_without_positive_lines_is_rejected() {
        assert_matches!(normalize_lines(&[]), Err(ServiceError::ValidationError(_)));
        assert_matches!(
            normalize_lines(&[line(1, 0), line(2, -1)]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn overflowing_quantities_are_rejected() {
        assert_matches!(
            normalize_lines(&[line(1, i32::MAX), line(1, 1)]),
            Err(ServiceError::ValidationError(_))
        );
    }
}
