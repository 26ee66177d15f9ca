pub mod cart;
pub mod customer;
pub mod discount;
pub mod product;
pub mod rule;
pub mod usage;
