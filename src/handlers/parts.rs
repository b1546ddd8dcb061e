use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::entities::part;
use crate::errors::ServiceError;
use crate::repositories::part_repository::{NewPart, PartChanges, PartWithProducts};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/parts",
    responses(
        (status = 200, description = "Parts with the products using them", body = ApiResponse<Vec<PartWithProducts>>),
    ),
    tag = "parts"
)]
pub async fn list_parts(State(state): State<AppState>) -> ApiResult<Vec<PartWithProducts>> {
    let parts = state.services.parts.get_all_parts().await?;
    Ok(Json(ApiResponse::success(parts)))
}

#[utoipa::path(
    post,
    path = "/api/v1/parts",
    request_body = NewPart,
    responses(
        (status = 201, description = "Part created", body = ApiResponse<part::Model>),
        (status = 400, description = "Invalid part data", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn create_part(
    State(state): State<AppState>,
    Json(payload): Json<NewPart>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.parts.add_part(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}",
    params(("id" = i32, Path, description = "Part ID")),
    responses(
        (status = 200, description = "Part retrieved", body = ApiResponse<PartWithProducts>),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<PartWithProducts> {
    let part = state
        .services
        .parts
        .get_part_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", id)))?;
    Ok(Json(ApiResponse::success(part)))
}

#[utoipa::path(
    put,
    path = "/api/v1/parts/{id}",
    params(("id" = i32, Path, description = "Part ID")),
    request_body = PartChanges,
    responses(
        (status = 200, description = "Part updated", body = ApiResponse<part::Model>),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn update_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<PartChanges>,
) -> ApiResult<part::Model> {
    payload.validate()?;
    let updated = state.services.parts.update_part(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parts/{id}",
    params(("id" = i32, Path, description = "Part ID")),
    responses(
        (status = 204, description = "Part deleted"),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
    ),
    tag = "parts"
)]
pub async fn delete_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.parts.delete_part(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
