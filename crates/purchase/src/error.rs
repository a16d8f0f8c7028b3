//! Purchase error types.

use std::time::Duration;

use common::{ProductId, UserId};
use ledger::{LedgerError, ValidationError};
use reservations::ReservationError;
use thiserror::Error;

/// Terminal outcomes of purchase and catalog operations.
///
/// None of these are retried inside the engine.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Purchase attempted without an active cart reservation.
    #[error("No cart reservation for product {product_id} by user {user_id}")]
    NoReservation {
        product_id: ProductId,
        user_id: UserId,
    },

    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The caller may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Stock was exhausted when the row lock was taken.
    #[error("Product {0} is out of stock")]
    OutOfStock(ProductId),

    /// The partial update named no field.
    #[error("Nothing to update")]
    NothingToUpdate,

    /// A field value would break a product invariant.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// The reservation cache failed or timed out.
    #[error("Reservation store unavailable: {0}")]
    StoreUnavailable(#[from] ReservationError),

    /// The request deadline elapsed. Any open transaction was rolled back.
    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// The ledger failed unexpectedly.
    #[error("Internal ledger error: {0}")]
    Internal(#[source] LedgerError),
}

impl PurchaseError {
    /// Short label used for outcome metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PurchaseError::NoReservation { .. } => "no_reservation",
            PurchaseError::NotFound(_) => "not_found",
            PurchaseError::Forbidden(_) => "forbidden",
            PurchaseError::OutOfStock(_) => "out_of_stock",
            PurchaseError::NothingToUpdate => "nothing_to_update",
            PurchaseError::InvalidField { .. } => "invalid_field",
            PurchaseError::StoreUnavailable(_) => "store_unavailable",
            PurchaseError::Timeout(_) => "timeout",
            PurchaseError::Internal(_) => "internal",
        }
    }
}

impl From<ValidationError> for PurchaseError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::NothingToUpdate => PurchaseError::NothingToUpdate,
            ValidationError::InvalidField { field, reason } => {
                PurchaseError::InvalidField { field, reason }
            }
        }
    }
}

impl From<LedgerError> for PurchaseError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(id) => PurchaseError::NotFound(id),
            LedgerError::Validation(v) => v.into(),
            other => PurchaseError::Internal(other),
        }
    }
}

/// Convenience type alias for purchase results.
pub type Result<T> = std::result::Result<T, PurchaseError>;
