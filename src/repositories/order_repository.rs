use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::entities::{customer, order, order_product, product};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// One product line of an order, priced at the product's current price.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderLine {
    pub product_id: i32,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    pub id: i32,
    pub order_date: DateTime<Utc>,
    pub customer: customer::Model,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyCount {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct DailyRevenue {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub revenue: Decimal,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Orders placed on the calendar days `[start, end]` (UTC). Either bound may be open.
fn order_date_condition(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Condition {
    let mut condition = Condition::all();
    if let Some(start) = start {
        condition = condition.add(order::Column::OrderDate.gte(start_of_day(start)));
    }
    if let Some(next_day) = end.and_then(|end| end.succ_opt()) {
        condition = condition.add(order::Column::OrderDate.lt(start_of_day(next_day)));
    }
    condition
}

fn within(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

/// Expands sparse per-day values into one entry per day of `[start, end]`, ascending.
/// Days missing from `observed` get `T::default()`.
pub fn fill_daily_series<T: Copy + Default>(
    start: NaiveDate,
    end: NaiveDate,
    observed: &HashMap<NaiveDate, T>,
) -> Vec<(NaiveDate, T)> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| (day, observed.get(&day).copied().unwrap_or_default()))
        .collect()
}

/// Repository for orders and the aggregates computed over them
#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Returns one page (1-based) of orders, newest first, plus the total count.
    pub async fn get_all_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderDetails>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .paginate(self.get_db(), per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((self.load_details(orders).await?, total))
    }

    pub async fn get_order_by_id(&self, id: i32) -> Result<Option<OrderDetails>, ServiceError> {
        let Some(order) = order::Entity::find_by_id(id).one(self.get_db()).await? else {
            return Ok(None);
        };
        Ok(self.load_details(vec![order]).await?.pop())
    }

    async fn load_details(
        &self,
        orders: Vec<order::Model>,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut customer_ids: Vec<i32> = orders.iter().map(|o| o.customer_id).collect();
        customer_ids.sort_unstable();
        customer_ids.dedup();

        let customers: HashMap<i32, customer::Model> = customer::Entity::find()
            .filter(customer::Column::Id.is_in(customer_ids))
            .all(self.get_db())
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut lines_by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        let rows = order_product::Entity::find()
            .filter(order_product::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_product::Column::ProductId)
            .find_also_related(product::Entity)
            .all(self.get_db())
            .await?;
        for (line, product) in rows {
            let Some(product) = product else { continue };
            lines_by_order.entry(line.order_id).or_default().push(OrderLine {
                product_id: product.id,
                line_total: product.price * Decimal::from(line.quantity),
                product_name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
            });
        }

        orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.customer_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Customer {} of order {} is missing",
                        order.customer_id, order.id
                    ))
                })?;
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                let total = lines.iter().map(|l| l.line_total).sum();
                Ok(OrderDetails {
                    id: order.id,
                    order_date: order.order_date,
                    customer,
                    lines,
                    total,
                })
            })
            .collect()
    }

    /// Number of orders placed on the days `[start, end]`.
    #[instrument(skip(self))]
    pub async fn get_total_orders_count(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<u64, ServiceError> {
        Ok(order::Entity::find()
            .filter(order_date_condition(start, end))
            .count(self.get_db())
            .await?)
    }

    /// Sum of `price * quantity` over the lines of every order in range.
    #[instrument(skip(self))]
    pub async fn get_total_revenue(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Decimal, ServiceError> {
        Ok(self
            .order_totals(start, end)
            .await?
            .into_iter()
            .map(|(_, total)| total)
            .sum())
    }

    #[instrument(skip(self))]
    pub async fn get_daily_order_counts(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCount>, ServiceError> {
        let dates: Vec<DateTime<Utc>> = order::Entity::find()
            .select_only()
            .column(order::Column::OrderDate)
            .filter(order_date_condition(Some(start), Some(end)))
            .into_tuple()
            .all(self.get_db())
            .await?;

        let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
        for date in dates {
            *counts.entry(date.date_naive()).or_default() += 1;
        }

        Ok(fill_daily_series(start, end, &counts)
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_daily_revenue(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRevenue>, ServiceError> {
        let mut revenue: HashMap<NaiveDate, Decimal> = HashMap::new();
        for (order_date, total) in self.order_totals(Some(start), Some(end)).await? {
            *revenue.entry(order_date.date_naive()).or_default() += total;
        }

        Ok(fill_daily_series(start, end, &revenue)
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect())
    }

    /// Customers whose first ever order falls on the days `[start, end]`.
    #[instrument(skip(self))]
    pub async fn get_new_customers_count(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<u64, ServiceError> {
        let rows: Vec<(i32, DateTime<Utc>)> = order::Entity::find()
            .select_only()
            .column(order::Column::CustomerId)
            .column(order::Column::OrderDate)
            .into_tuple()
            .all(self.get_db())
            .await?;

        let mut first_orders: BTreeMap<i32, DateTime<Utc>> = BTreeMap::new();
        for (customer_id, order_date) in rows {
            first_orders
                .entry(customer_id)
                .and_modify(|first| *first = (*first).min(order_date))
                .or_insert(order_date);
        }

        Ok(first_orders
            .values()
            .filter(|first| within(first.date_naive(), start, end))
            .count() as u64)
    }

    /// `(order_date, total)` for every order in range.
    async fn order_totals(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(DateTime<Utc>, Decimal)>, ServiceError> {
        let prices: HashMap<i32, Decimal> = product::Entity::find()
            .all(self.get_db())
            .await?
            .into_iter()
            .map(|p| (p.id, p.price))
            .collect();

        let orders = order::Entity::find()
            .filter(order_date_condition(start, end))
            .order_by_asc(order::Column::Id)
            .find_with_related(order_product::Entity)
            .all(self.get_db())
            .await?;

        Ok(orders
            .into_iter()
            .map(|(order, lines)| {
                let total = lines
                    .iter()
                    .filter_map(|line| {
                        prices
                            .get(&line.product_id)
                            .map(|price| *price * Decimal::from(line.quantity))
                    })
                    .sum();
                (order.order_date, total)
            })
            .collect())
    }
}

impl Repository for OrderRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
