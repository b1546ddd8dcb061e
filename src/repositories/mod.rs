use sea_orm::DatabaseConnection;
use std::sync::Arc;
use validator::ValidationError;

pub mod customer_repository;
pub mod order_repository;
pub mod part_repository;
pub mod product_repository;

pub use customer_repository::CustomerRepository;
pub use order_repository::OrderRepository;
pub use part_repository::PartRepository;
pub use product_repository::ProductRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub(crate) fn validate_price(value: &rust_decimal::Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}

pub(crate) fn validate_stock(value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new("negative_stock"));
    }
    Ok(())
}

/// Escapes `%`, `_` and `\` so `term` matches literally inside a LIKE pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn like_pattern_lowercases_and_escapes() {
        assert_eq!(like_pattern("Jack"), "%jack%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn blank_names_and_negative_amounts_are_rejected() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("Neo").is_ok());
        assert!(validate_price(&dec!(-0.01)).is_err());
        assert!(validate_price(&dec!(0)).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(0).is_ok());
    }
}
