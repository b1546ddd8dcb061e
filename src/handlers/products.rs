use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::entities::product;
use crate::errors::ServiceError;
use crate::repositories::product_repository::{NewProduct, ProductChanges, ProductWithParts};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Products with their parts", body = ApiResponse<Vec<ProductWithParts>>),
    ),
    tag = "products"
)]
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<ProductWithParts>> {
    let products = state.services.products.get_all_products().await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.products.add_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductWithParts>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<ProductWithParts> {
    let product = state
        .services
        .products
        .get_product_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = ProductChanges,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductChanges>,
) -> ApiResult<product::Model> {
    payload.validate()?;
    let updated = state.services.products.update_product(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product is part of existing orders", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/parts/{part_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("part_id" = i32, Path, description = "Part ID"),
    ),
    responses(
        (status = 200, description = "Part linked", body = ApiResponse<ProductWithParts>),
        (status = 404, description = "Product or part not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn link_part(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(i32, i32)>,
) -> ApiResult<ProductWithParts> {
    let product = state.services.products.link_part(id, part_id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}/parts/{part_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("part_id" = i32, Path, description = "Part ID"),
    ),
    responses(
        (status = 204, description = "Part unlinked"),
        (status = 404, description = "Part is not linked to the product", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn unlink_part(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.unlink_part(id, part_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
