pub mod ops;
pub mod products;
