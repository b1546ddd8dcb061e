use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A spare part kept in stock for maintenance of the products.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Part)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price: Decimal,
    pub stock: i32,
    #[serde(skip)]
    #[sea_orm(column_type = "Blob", nullable)]
    pub image: Option<Vec<u8>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_part::Entity")]
    ProductParts,
}

impl Related<super::product_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductParts.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_part::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_part::Relation::Part.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
