use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::repositories::order_repository::{DailyCount, DailyRevenue};
use crate::repositories::{CustomerRepository, OrderRepository};

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range of at most `max_days` days.
    pub fn new(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        let days = (end - start).num_days() + 1;
        if days > i64::from(max_days) {
            return Err(ServiceError::ValidationError(format!(
                "Date range spans {} days; at most {} are allowed",
                days, max_days
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, of which only the date is kept.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
        .map_err(|_| {
            ServiceError::ValidationError(format!(
                "Invalid date '{}'; expected YYYY-MM-DD",
                raw
            ))
        })
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStatistics {
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub total_customers: u64,
    pub new_customers: u64,
    pub daily_order_counts: Vec<DailyCount>,
    pub daily_revenue: Vec<DailyRevenue>,
}

#[derive(Clone)]
pub struct DashboardService {
    orders: OrderRepository,
    customers: CustomerRepository,
    default_days: u32,
    max_range_days: u32,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, default_days: u32, max_range_days: u32) -> Self {
        Self {
            orders: OrderRepository::new(db_pool.clone()),
            customers: CustomerRepository::new(db_pool),
            default_days,
            max_range_days,
        }
    }

    /// Resolves optional request dates against `today`. A missing end is today; a
    /// missing start lies the configured number of days before the end.
    pub fn resolve_range(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<DateRange, ServiceError> {
        let end = end.map(parse_date).transpose()?.unwrap_or(today);
        let start = match start.map(parse_date).transpose()? {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(u64::from(self.default_days)))
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "End date {} is out of the supported range",
                        end
                    ))
                })?,
        };
        DateRange::new(start, end, self.max_range_days)
    }

    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub async fn statistics(&self, range: DateRange) -> Result<DashboardStatistics, ServiceError> {
        let (start, end) = (Some(range.start), Some(range.end));

        let total_orders = self.orders.get_total_orders_count(start, end).await?;
        let total_revenue = self.orders.get_total_revenue(start, end).await?;
        let total_customers = self.customers.count_customers().await?;
        let new_customers = self.orders.get_new_customers_count(start, end).await?;
        let daily_order_counts = self
            .orders
            .get_daily_order_counts(range.start, range.end)
            .await?;
        let daily_revenue = self.orders.get_daily_revenue(range.start, range.end).await?;

        debug!(total_orders, days = range.days(), "Dashboard statistics computed");

        Ok(DashboardStatistics {
            start_date: range.start,
            end_date: range.end,
            total_orders,
            total_revenue,
            total_customers,
            new_customers,
            daily_order_counts,
            daily_revenue,
        })
    }

    /// Statistics for the default window ending today (UTC).
    pub async fn default_statistics(&self) -> Result<DashboardStatistics, ServiceError> {
        let range = self.resolve_range(None, None, Utc::now().date_naive())?;
        self.statistics(range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service() -> DashboardService {
        let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
        DashboardService::new(db, 30, 366)
    }

    #[rstest]
    #[case("2024-03-15", "2024-03-15")]
    #[case(" 2024-03-15 ", "2024-03-15")]
    #[case("2024-03-15T23:59:59Z", "2024-03-15")]
    #[case("2024-03-15T01:00:00+02:00", "2024-03-15")]
    fn dates_parse_to_calendar_days(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(parse_date(raw).unwrap(), date(expected));
    }

    #[rstest]
    #[case("15-03-2024")]
    #[case("2024-02-30")]
    #[case("")]
    fn malformed_dates_are_rejected(#[case] raw: &str) {
        assert_matches!(parse_date(raw), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        assert_matches!(
            DateRange::new(date("2024-03-02"), date("2024-03-01"), 366),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn range_length_is_capped() {
        assert!(DateRange::new(date("2024-01-01"), date("2024-12-31"), 366).is_ok());
        assert_matches!(
            DateRange::new(date("2023-12-31"), date("2024-12-31"), 366),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn missing_dates_default_to_window_ending_today() {
        let today = date("2024-06-30");
        let range = service().resolve_range(None, None, today).unwrap();
        assert_eq!(range.start, date("2024-05-31"));
        assert_eq!(range.end, today);
        assert_eq!(range.days(), 31);

        let range = service()
            .resolve_range(None, Some("2024-02-10"), today)
            .unwrap();
        assert_eq!(range.start, date("2024-01-11"));

        let range = service()
            .resolve_range(Some("2024-06-01"), None, today)
            .unwrap();
        assert_eq!(range, DateRange::new(date("2024-06-01"), today, 366).unwrap());
    }

    #[rstest]
    #[case("-262143-01-05")]
    #[case("-262143-01-20")]
    fn end_dates_near_the_calendar_floor_are_rejected(#[case] end: &str) {
        let today = date("2024-06-30");
        assert_matches!(
            service().resolve_range(None, Some(end), today),
            Err(ServiceError::ValidationError(_))
        );
    }
}
