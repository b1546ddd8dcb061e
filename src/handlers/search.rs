use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::catalog::{SearchResult, Suggestion};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub term: String,
}

/// Search products by name
#[utoipa::path(
    get,
    path = "/api/v1/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "A single product or the list of matches", body = ApiResponse<SearchResult>),
        (status = 400, description = "Empty search term", body = crate::errors::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchResult> {
    let result = state.services.catalog.search(&query.q).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Autocomplete over product and part names
#[utoipa::path(
    get,
    path = "/api/v1/search/suggestions",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Up to ten suggestions", body = ApiResponse<Vec<Suggestion>>),
    ),
    tag = "search"
)]
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> ApiResult<Vec<Suggestion>> {
    let suggestions = state.services.catalog.suggestions(&query.term).await?;
    Ok(Json(ApiResponse::success(suggestions)))
}
