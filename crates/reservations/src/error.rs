use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the reservation cache.
///
/// A missing reservation is not an error; `exists` reports it as `false`.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The cache could not be reached or rejected the command.
    #[error("Reservation store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    /// The cache did not answer within the operation bound.
    #[error("Reservation store timed out after {0:?}")]
    Timeout(Duration),

    /// The store was switched off for testing.
    #[error("Reservation store offline")]
    Offline,
}

/// Result type for reservation store operations.
pub type Result<T> = std::result::Result<T, ReservationError>;
