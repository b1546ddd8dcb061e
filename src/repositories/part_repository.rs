use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{begin_transaction, commit_transaction, rollback_transaction};
use crate::entities::{part, product, product_part};
use crate::errors::ServiceError;
use crate::repositories::{
    like_pattern, validate_not_blank, validate_price, validate_stock, Repository,
};

use super::BaseRepository;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewPart {
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
pub struct PartChanges {
    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_stock")]
    pub stock: Option<i32>,
}

/// A part together with the products that use it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartWithProducts {
    #[serde(flatten)]
    pub part: part::Model,
    pub has_image: bool,
    pub products: Vec<product::Model>,
}

impl PartWithProducts {
    pub fn new(part: part::Model, products: Vec<product::Model>) -> Self {
        Self {
            has_image: part.image.is_some(),
            part,
            products,
        }
    }
}

/// Repository for spare parts
#[derive(Debug, Clone)]
pub struct PartRepository {
    base: BaseRepository,
}

impl PartRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn add_part(&self, new: NewPart) -> Result<part::Model, ServiceError> {
        let created = part::ActiveModel {
            name: Set(new.name.trim().to_string()),
            description: Set(new.description),
            price: Set(new.price),
            stock: Set(new.stock),
            image: Set(None),
            ..Default::default()
        }
        .insert(self.get_db())
        .await?;

        info!(part_id = created.id, "Part created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_part(
        &self,
        id: i32,
        changes: PartChanges,
    ) -> Result<part::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let mut active: part::ActiveModel = existing.into();

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

    pub async fn get_all_parts(&self) -> Result<Vec<PartWithProducts>, ServiceError> {
        let rows = part::Entity::find()
            .order_by_asc(part::Column::Id)
            .find_with_related(product::Entity)
            .all(self.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(part, products)| PartWithProducts::new(part, products))
            .collect())
    }

    pub async fn get_part_by_id(&self, id: i32) -> Result<Option<PartWithProducts>, ServiceError> {
        let Some(part) = part::Entity::find_by_id(id).one(self.get_db()).await? else {
            return Ok(None);
        };

        let products = part
            .find_related(product::Entity)
            .order_by_asc(product::Column::Id)
            .all(self.get_db())
            .await?;

        Ok(Some(PartWithProducts::new(part, products)))
    }

    /// Deletes a part and its product links.
    #[instrument(skip(self))]
    pub async fn delete_part(&self, id: i32) -> Result<(), ServiceError> {
        self.find_model(id).await?;

        let started = Instant::now();
        let txn = begin_transaction(self.get_db(), "delete_part").await?;
        let result = async {
            product_part::Entity::delete_many()
                .filter(product_part::Column::PartId.eq(id))
                .exec(&txn)
                .await?;
            part::Entity::delete_by_id(id).exec(&txn).await?;
            Ok::<_, ServiceError>(())
        }
        .await;

        match result {
            Ok(()) => commit_transaction(txn, "delete_part", started).await?,
            Err(e) => {
                rollback_transaction(txn, "delete_part", &e).await;
                return Err(e);
            }
        }

        info!(part_id = id, "Part deleted");
        Ok(())
    }

    pub async fn search_by_name(
        &self,
        term: &str,
        limit: Option<u64>,
    ) -> Result<Vec<part::Model>, ServiceError> {
        let pattern = LikeExpr::new(like_pattern(term)).escape('\\');
        Ok(part::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(part::Column::Name))).like(pattern))
            .order_by_asc(part::Column::Name)
            .limit(limit)
            .all(self.get_db())
            .await?)
    }

    pub async fn increment_stock<C: ConnectionTrait>(
        conn: &C,
        part_id: i32,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let result = part::Entity::update_many()
            .col_expr(
                part::Column::Stock,
                Expr::col(part::Column::Stock).add(quantity),
            )
            .filter(part::Column::Id.eq(part_id))
            .filter(part::Column::Stock.lte(i32::MAX.saturating_sub(quantity)))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_model(&self, id: i32) -> Result<part::Model, ServiceError> {
        part::Entity::find_by_id(id)
            .one(self.get_db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", id)))
    }
}

impl Repository for PartRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_changes_validate_only_present_fields() {
        assert!(PartChanges::default().validate().is_ok());

        let changes = PartChanges {
            stock: Some(-5),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
    }
}
