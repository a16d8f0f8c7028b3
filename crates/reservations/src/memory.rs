use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{ReservationError, ReservationKey, Result, store::ReservationStore};

/// In-memory reservation store for testing.
///
/// Expiry is checked against the tokio clock on read, so tests can pause and
/// advance time. Expired entries are dropped on read and on every `put`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    entries: Arc<RwLock<HashMap<ReservationKey, Instant>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryReservationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the cache were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the number of unexpired reservations.
    pub async fn active_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ReservationError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn put(&self, key: ReservationKey, ttl: Duration) -> Result<()> {
        self.check_online()?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(key, now + ttl);
        Ok(())
    }

    async fn exists(&self, key: ReservationKey) -> Result<bool> {
        self.check_online()?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(&key).copied() {
            Some(expires_at) if expires_at > now => Ok(true),
            Some(_) => {
                entries.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, key: ReservationKey) -> Result<()> {
        self.check_online()?;
        self.entries.write().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{ProductId, UserId};

    use super::*;

    fn key() -> ReservationKey {
        ReservationKey::new(ProductId::new(1), UserId::new(2))
    }

    #[tokio::test(start_paused = true)]
    async fn put_prunes_expired_entries() {
        let store = InMemoryReservationStore::new();
        for user in 0..10 {
            let stale = ReservationKey::new(ProductId::new(1), UserId::new(user));
            store.put(stale, Duration::from_secs(5)).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(6)).await;

        store.put(key(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.entries.read().await.len(), 1);
        assert!(store.exists(key()).await.unwrap());
    }

    #[tokio::test]
    async fn put_then_exists() {
        let store = InMemoryReservationStore::new();
        assert!(!store.exists(key()).await.unwrap());

        store.put(key(), Duration::from_secs(60)).await.unwrap();
        assert!(store.exists(key()).await.unwrap());
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryReservationStore::new();
        store.put(key(), Duration::from_secs(60)).await.unwrap();

        store.remove(key()).await.unwrap();
        store.remove(key()).await.unwrap();
        assert!(!store.exists(key()).await.unwrap());
    }

    #[tokio::test]
    async fn keys_are_scoped_to_user_and_product() {
        let store = InMemoryReservationStore::new();
        store.put(key(), Duration::from_secs(60)).await.unwrap();

        let other_user = ReservationKey::new(ProductId::new(1), UserId::new(3));
        let other_product = ReservationKey::new(ProductId::new(9), UserId::new(2));
        assert!(!store.exists(other_user).await.unwrap());
        assert!(!store.exists(other_product).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn reservation_expires_after_ttl() {
        let store = InMemoryReservationStore::new();
        store.put(key(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.exists(key()).await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.exists(key()).await.unwrap());
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn put_refreshes_expiry() {
        let store = InMemoryReservationStore::new();
        store.put(key(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        store.put(key(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(store.exists(key()).await.unwrap());
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = InMemoryReservationStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.put(key(), Duration::from_secs(1)).await,
            Err(ReservationError::Offline)
        ));
        assert!(store.exists(key()).await.is_err());
        assert!(store.remove(key()).await.is_err());
    }
}
