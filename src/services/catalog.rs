use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::StockItemKind;
use crate::repositories::product_repository::ProductWithParts;
use crate::repositories::{PartRepository, ProductRepository};

/// Upper bound on the number of autocomplete entries.
pub const MAX_SUGGESTIONS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Suggestion {
    pub label: String,
    pub value: i32,
    pub kind: StockItemKind,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SearchResult {
    /// Exactly one product matched.
    SingleProduct { product: ProductWithParts },
    Matches { products: Vec<product::Model> },
}

/// Name lookups across products and parts
#[derive(Clone)]
pub struct CatalogService {
    products: ProductRepository,
    parts: PartRepository,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            products: ProductRepository::new(db_pool.clone()),
            parts: PartRepository::new(db_pool),
        }
    }

    /// Autocomplete entries: matching products first, then parts.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, term: &str) -> Result<Vec<Suggestion>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let mut suggestions: Vec<Suggestion> = self
            .products
            .search_by_name(term, Some(MAX_SUGGESTIONS))
            .await?
            .into_iter()
            .map(|p| Suggestion {
                label: p.name,
                value: p.id,
                kind: StockItemKind::Product,
            })
            .collect();

        let room = MAX_SUGGESTIONS.saturating_sub(suggestions.len() as u64);
        if room > 0 {
            suggestions.extend(
                self.parts
                    .search_by_name(term, Some(room))
                    .await?
                    .into_iter()
                    .map(|p| Suggestion {
                        label: p.name,
                        value: p.id,
                        kind: StockItemKind::Part,
                    }),
            );
        }

        debug!(count = suggestions.len(), "Suggestions found");
        Ok(suggestions)
    }

    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<SearchResult, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::ValidationError(
                "Search term must not be empty".to_string(),
            ));
        }

        let mut products = self.products.search_by_name(term, None).await?;
        if products.len() == 1 {
            let id = products.remove(0).id;
            let product = self
                .products
                .get_product_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
            return Ok(SearchResult::SingleProduct { product });
        }
        Ok(SearchResult::Matches { products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(sea_orm::DatabaseConnection::Disconnected))
    }

    #[tokio::test]
    async fn blank_terms_suggest_nothing() {
        let suggestions = service().suggestions("  \t").await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn blank_search_terms_are_rejected() {
        assert_matches!(
            service().search("   ").await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn search_results_are_tagged() {
        let json = serde_json::to_value(SearchResult::Matches { products: vec![] }).unwrap();
        assert_eq!(json["result"], "matches");
        assert_eq!(json["products"], serde_json::json!([]));
    }
}
