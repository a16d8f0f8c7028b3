use thiserror::Error;

use crate::ProductId;

/// Rejections raised while validating product input, before any statement runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The patch carried no field to change.
    #[error("Nothing to update")]
    NothingToUpdate,

    /// A field value would break a product invariant.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors that can occur when interacting with the inventory ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The product row does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Stock was modified without first taking the row lock in this transaction.
    #[error("Product {0} is not locked by this transaction")]
    NotLocked(ProductId),

    /// A decrement would drive stock below zero.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    /// Product input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backing store refused or failed the operation.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
