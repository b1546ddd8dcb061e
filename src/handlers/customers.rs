use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use super::common::{PaginatedResponse, PaginationParams};
use crate::entities::customer;
use crate::errors::ServiceError;
use crate::repositories::customer_repository::{CustomerChanges, CustomerWithOrders, NewCustomer};
use crate::{ApiResponse, ApiResult, AppState};

/// List customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Customers retrieved", body = ApiResponse<PaginatedResponse<customer::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let page = params.page();
    let per_page = state.config.clamp_page_size(params.per_page);
    let (customers, total) = state
        .services
        .customers
        .get_all_customers(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        customers, page, per_page, total,
    ))))
}

/// Register a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = NewCustomer,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid customer data", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<NewCustomer>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.customers.add_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Get a customer with their orders
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer retrieved", body = ApiResponse<CustomerWithOrders>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<CustomerWithOrders> {
    let customer = state
        .services
        .customers
        .get_customer_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = CustomerChanges,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid customer data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CustomerChanges>,
) -> ApiResult<customer::Model> {
    payload.validate()?;
    let updated = state.services.customers.update_customer(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a customer without orders
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Customer still has orders", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
