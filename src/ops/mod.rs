pub mod catalog_ops;
pub mod error;
pub mod filter;
pub mod food_ops;
pub mod move_resolver;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;
pub mod validate;
