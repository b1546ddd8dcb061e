use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{begin_transaction, commit_transaction, rollback_transaction};
use crate::entities::{order_product, part, product, product_part};
use crate::errors::ServiceError;
use crate::repositories::{
    like_pattern, validate_not_blank, validate_price, validate_stock, Repository,
};

use super::BaseRepository;

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProduct {
    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_stock")]
    pub stock: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductChanges {
    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_stock")]
    pub stock: Option<i32>,
}

/// A product together with the parts it is built from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductWithParts {
    #[serde(flatten)]
    pub product: product::Model,
    pub has_image: bool,
    pub parts: Vec<part::Model>,
}

impl ProductWithParts {
    pub fn new(product: product::Model, parts: Vec<part::Model>) -> Self {
        Self {
            has_image: product.image.is_some(),
            product,
            parts,
        }
    }
}

/// Repository for product operations
#[derive(Debug, Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn add_product(&self, new: NewProduct) -> Result<product::Model, ServiceError> {
        let created = product::ActiveModel {
            name: Set(new.name.trim().to_string()),
            description: Set(new.description),
            price: Set(new.price),
            stock: Set(new.stock),
            image: Set(None),
            ..Default::default()
        }
        .insert(self.get_db())
        .await?;

        info!(product_id = created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock);
        }

        Ok(active.update(self.get_db()).await?)
    }

    pub async fn get_all_products(&self) -> Result<Vec<ProductWithParts>, ServiceError> {
        let rows = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .find_with_related(part::Entity)
            .all(self.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(product, parts)| ProductWithParts::new(product, parts))
            .collect())
    }

    pub async fn get_product_by_id(
        &self,
        id: i32,
    ) -> Result<Option<ProductWithParts>, ServiceError> {
        let Some(product) = product::Entity::find_by_id(id).one(self.get_db()).await? else {
            return Ok(None);
        };

        let parts = product
            .find_related(part::Entity)
            .order_by_asc(part::Column::Id)
            .all(self.get_db())
            .await?;

        Ok(Some(ProductWithParts::new(product, parts)))
    }

    /// Deletes a product that no order line refers to, together with its part links.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        self.find_model(id).await?;

        let referenced = order_product::Entity::find()
            .filter(order_product::Column::ProductId.eq(id))
            .count(self.get_db())
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} is referenced by {} order line(s)",
                id, referenced
            )));
        }

        let started = Instant::now();
        let txn = begin_transaction(self.get_db(), "delete_product").await?;
        let result = async {
            product_part::Entity::delete_many()
                .filter(product_part::Column::ProductId.eq(id))
                .exec(&txn)
                .await?;
            product::Entity::delete_by_id(id).exec(&txn).await?;
            Ok::<_, ServiceError>(())
        }
        .await;

        match result {
            Ok(()) => commit_transaction(txn, "delete_product", started).await?,
            Err(e) => {
                rollback_transaction(txn, "delete_product", &e).await;
                return Err(e);
            }
        }

        info!(product_id = id, "Product deleted");
        Ok(())
    }

    /// Products that can still be ordered.
    pub async fn get_products_in_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::Stock.gt(0))
            .order_by_asc(product::Column::Name)
            .all(self.get_db())
            .await?)
    }

    /// Links a part to a product. Linking an already linked part is a no-op.
    #[instrument(skip(self))]
    pub async fn link_part(
        &self,
        product_id: i32,
        part_id: i32,
    ) -> Result<ProductWithParts, ServiceError> {
        self.find_model(product_id).await?;
        part::Entity::find_by_id(part_id)
            .one(self.get_db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", part_id)))?;

        let existing = product_part::Entity::find_by_id((product_id, part_id))
            .one(self.get_db())
            .await?;
        if existing.is_none() {
            product_part::ActiveModel {
                product_id: Set(product_id),
                part_id: Set(part_id),
            }
            .insert(self.get_db())
            .await?;
            info!(product_id, part_id, "Part linked to product");
        }

        self.get_product_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn unlink_part(&self, product_id: i32, part_id: i32) -> Result<(), ServiceError> {
        let result = product_part::Entity::delete_by_id((product_id, part_id))
            .exec(self.get_db())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Part {} is not linked to product {}",
                part_id, product_id
            )));
        }
        info!(product_id, part_id, "Part unlinked from product");
        Ok(())
    }

    /// Case-insensitive substring match on the product name, ordered by name.
    pub async fn search_by_name(
        &self,
        term: &str,
        limit: Option<u64>,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let pattern = LikeExpr::new(like_pattern(term)).escape('\\');
        Ok(product::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(product::Column::Name))).like(pattern))
            .order_by_asc(product::Column::Name)
            .limit(limit)
            .all(self.get_db())
            .await?)
    }

    /// Takes `quantity` units off a product's stock unless that would make it negative.
    /// Returns `false` when the product is missing or has too little stock.
    pub async fn try_decrement_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: i32,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let result = product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Adds `quantity` units to a product's stock unless the sum would leave the `i32` range.
    /// Returns `false` when the product is missing or the stock is already too high.
    pub async fn increment_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: i32,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let result = product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.lte(i32::MAX.saturating_sub(quantity)))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_model(&self, id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.get_db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }
}

impl Repository for ProductRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn product_input_rejects_negative_price_and_stock() {
        let mut new = NewProduct {
            name: "Jack-in Chair".into(),
            description: String::new(),
            price: dec!(-1),
            stock: 3,
        };
        assert!(new.validate().is_err());

        new.price = dec!(500.50);
        new.stock = -2;
        assert!(new.validate().is_err());

        new.stock = 0;
        assert!(new.validate().is_ok());
    }

    #[test]
    fn description_defaults_to_empty() {
        let new: NewProduct = serde_json::from_str(r#"{"name":"EMP","price":"129.99"}"#).unwrap();
        assert_eq!(new.description, "");
        assert_eq!(new.stock, 0);
        assert_eq!(new.price, dec!(129.99));
    }
}
