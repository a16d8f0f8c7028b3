use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{ReservationError, ReservationKey, Result, store::ReservationStore};

const MARKER: &str = "1";

/// Redis-backed reservation store.
///
/// Every command is bounded by `op_timeout`, so a hung cache surfaces as
/// [`ReservationError::Timeout`] instead of blocking the caller.
#[derive(Clone)]
pub struct RedisReservationStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisReservationStore {
    /// Wraps an already established connection manager.
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }

    /// Connects to `url` (e.g. `redis://:password@host:6379/0`).
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| ReservationError::Timeout(op_timeout))??;
        tracing::info!("connected to reservation cache");
        Ok(Self::new(conn, op_timeout))
    }

    async fn bounded<T>(&self, command: impl Future<Output = redis::RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, command).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ReservationError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl ReservationStore for RedisReservationStore {
    async fn put(&self, key: ReservationKey, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key.cache_key(), MARKER, seconds))
            .await
    }

    async fn exists(&self, key: ReservationKey) -> Result<bool> {
        let mut conn = self.conn.clone();
        self.bounded(conn.exists::<_, bool>(key.cache_key())).await
    }

    async fn remove(&self, key: ReservationKey) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(key.cache_key())).await
    }
}
