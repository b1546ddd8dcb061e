pub mod customer;
pub mod order;
pub mod order_product;
pub mod part;
pub mod product;
pub mod product_part;
