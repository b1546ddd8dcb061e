use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::services::stock::{
    RestockRequest, StockAdjustmentRequest, StockLevel, StockOverview,
};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/stock",
    responses(
        (status = 200, description = "Current stock of products and parts", body = ApiResponse<StockOverview>),
    ),
    tag = "stock"
)]
pub async fn stock_overview(State(state): State<AppState>) -> ApiResult<StockOverview> {
    let overview = state.services.stock.stock_overview().await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// Replenish products and parts
#[utoipa::path(
    post,
    path = "/api/v1/stock/restock",
    request_body = RestockRequest,
    responses(
        (status = 200, description = "New stock levels", body = ApiResponse<Vec<StockLevel>>),
        (status = 400, description = "Nothing to restock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or part not found", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn restock(
    State(state): State<AppState>,
    Json(payload): Json<RestockRequest>,
) -> ApiResult<Vec<StockLevel>> {
    let levels = state.services.stock.restock(payload).await?;
    Ok(Json(ApiResponse::success(levels)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/products/{id}/adjust",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 200, description = "New stock level", body = ApiResponse<StockLevel>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock would become negative", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn adjust_product_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StockAdjustmentRequest>,
) -> ApiResult<StockLevel> {
    let level = state.services.stock.adjust_product_stock(id, payload).await?;
    Ok(Json(ApiResponse::success(level)))
}
