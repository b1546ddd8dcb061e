use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use super::common::{PaginatedResponse, PaginationParams};
use crate::errors::ServiceError;
use crate::repositories::order_repository::OrderDetails;
use crate::services::orders::{CreateOrderRequest, EditOrderRequest, OrderFormOptions};
use crate::{ApiResponse, ApiResult, AppState};

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<OrderDetails>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<OrderDetails>> {
    let page = params.page();
    let per_page = state.config.clamp_page_size(params.per_page);
    let (orders, total) = state.services.orders.list_orders(page, per_page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        orders, page, per_page, total,
    ))))
}

/// Place an order
///
/// Ordered quantities are taken out of stock. When any product has too little
/// stock nothing is stored.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetails>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "No orderable lines or inactive customer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Products in stock and active customers for the order form
#[utoipa::path(
    get,
    path = "/api/v1/orders/options",
    responses(
        (status = 200, description = "Order form options", body = ApiResponse<OrderFormOptions>),
    ),
    tag = "orders"
)]
pub async fn order_options(State(state): State<AppState>) -> ApiResult<OrderFormOptions> {
    let options = state.services.orders.order_form_options().await?;
    Ok(Json(ApiResponse::success(options)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<OrderDetails> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Replace the lines of an order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = EditOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderDetails>),
        (status = 400, description = "No orderable lines", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn edit_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EditOrderRequest>,
) -> ApiResult<OrderDetails> {
    let order = state.services.orders.edit_order(id, payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Cancel an order and return its quantities to stock
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
