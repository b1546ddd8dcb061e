use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::dashboard::DashboardStatistics;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// First day, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Last day (inclusive), `YYYY-MM-DD`
    pub end_date: Option<String>,
}

/// Order, revenue and customer statistics with per-day series
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Statistics for the range", body = ApiResponse<DashboardStatistics>),
        (status = 400, description = "Invalid or too long date range", body = crate::errors::ErrorResponse),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<DashboardStatistics> {
    let dashboard = &state.services.dashboard;
    let range = dashboard.resolve_range(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;
    let statistics = dashboard.statistics(range).await?;
    Ok(Json(ApiResponse::success(statistics)))
}
