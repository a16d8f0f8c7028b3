use std::time::Duration;

use async_trait::async_trait;

use crate::{ReservationKey, Result};

/// Ephemeral store of cart reservations.
///
/// A reservation is advisory. It holds no stock aside, and it disappears on its
/// own once its TTL elapses. Calls for different keys carry no ordering guarantee.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Records the reservation with expiry `ttl` from now.
    ///
    /// Re-putting an existing key refreshes its expiry. Last write wins.
    async fn put(&self, key: ReservationKey, ttl: Duration) -> Result<()>;

    /// Returns true iff an unexpired reservation exists for `key`.
    async fn exists(&self, key: ReservationKey) -> Result<bool>;

    /// Deletes the reservation. Removing an absent key is not an error.
    async fn remove(&self, key: ReservationKey) -> Result<()>;
}
