use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{customer, order};
use crate::errors::ServiceError;
use crate::repositories::{validate_not_blank, Repository};

use super::BaseRepository;

fn default_active() -> bool {
    true
}

/// Input for registering a customer.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCustomer {
    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 500), custom = "validate_not_blank")]
    pub address: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Partial update of a customer; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CustomerChanges {
    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 500), custom = "validate_not_blank")]
    pub address: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerWithOrders {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub orders: Vec<order::Model>,
}

/// Repository for customer operations
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn add_customer(&self, new: NewCustomer) -> Result<customer::Model, ServiceError> {
        let created = customer::ActiveModel {
            name: Set(new.name.trim().to_string()),
            address: Set(new.address.trim().to_string()),
            active: Set(new.active),
            ..Default::default()
        }
        .insert(self.get_db())
        .await?;

        info!(customer_id = created.id, "Customer created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_customer(
        &self,
        id: i32,
        changes: CustomerChanges,
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.find_model(id).await?;
        let mut active: customer::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = changes.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(flag) = changes.active {
            active.active = Set(flag);
        }

        Ok(active.update(self.get_db()).await?)
    }

    /// Deletes a customer that has no orders.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: i32) -> Result<(), ServiceError> {
        let existing = self.find_model(id).await?;

        let order_count = order::Entity::find()
            .filter(order::Column::CustomerId.eq(id))
            .count(self.get_db())
            .await?;
        if order_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} still has {} order(s)",
                id, order_count
            )));
        }

        existing.delete(self.get_db()).await?;
        info!(customer_id = id, "Customer deleted");
        Ok(())
    }

    /// Returns one page (1-based) of customers ordered by id, plus the total count.
    pub async fn get_all_customers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_asc(customer::Column::Id)
            .paginate(self.get_db(), per_page);

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((customers, total))
    }

    pub async fn get_customer_by_id(
        &self,
        id: i32,
    ) -> Result<Option<CustomerWithOrders>, ServiceError> {
        let Some(customer) = customer::Entity::find_by_id(id).one(self.get_db()).await? else {
            return Ok(None);
        };

        let orders = customer
            .find_related(order::Entity)
            .order_by_desc(order::Column::OrderDate)
            .all(self.get_db())
            .await?;

        Ok(Some(CustomerWithOrders { customer, orders }))
    }

    pub async fn count_customers(&self) -> Result<u64, ServiceError> {
        Ok(customer::Entity::find().count(self.get_db()).await?)
    }

    pub async fn get_active_customers(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Ok(customer::Entity::find()
            .filter(customer::Column::Active.eq(true))
            .order_by_asc(customer::Column::Name)
            .all(self.get_db())
            .await?)
    }

    async fn find_model(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(self.get_db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }
}

impl Repository for CustomerRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_customer_fields_fail_validation() {
        let new = NewCustomer {
            name: "  ".into(),
            address: "123 Elm St".into(),
            active: true,
        };
        assert!(new.validate().is_err());

        let changes = CustomerChanges {
            address: Some(String::new()),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
        assert!(CustomerChanges::default().validate().is_ok());
    }

    #[test]
    fn new_customers_are_active_unless_stated() {
        let new: NewCustomer =
            serde_json::from_str(r#"{"name":"Neo","address":"123 Elm St"}"#).unwrap();
        assert!(new.active);
    }
}
