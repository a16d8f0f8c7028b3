//! Reservation-gated purchase of a single unit.

use std::time::{Duration, Instant};

use common::{Identity, ProductId};
use ledger::{InventoryLedger, LedgerTransaction};
use reservations::{DEFAULT_CART_TTL, ReservationKey, ReservationStore};

use crate::error::{PurchaseError, Result};
use crate::state::PurchaseState;

/// Default bound on the gated, locked part of a purchase.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(50);

/// Tunables for [`PurchaseOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseConfig {
    /// Lifetime of a cart reservation.
    pub cart_ttl: Duration,
    /// Upper bound from reservation check through commit.
    pub deadline: Duration,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            cart_ttl: DEFAULT_CART_TTL,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Tracks the state of one purchase attempt and logs each transition.
#[derive(Debug)]
struct Progress {
    key: ReservationKey,
    state: PurchaseState,
}

impl Progress {
    fn new(key: ReservationKey) -> Self {
        Self {
            key,
            state: PurchaseState::Start,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            tracing::debug!(reservation = %self.key, from = %self.state, to = %next, "purchase advanced");
            self.state = next;
        }
    }

    fn abort(&mut self, reason: &PurchaseError) {
        if self.state.can_abort() {
            tracing::debug!(reservation = %self.key, from = %self.state, reason = %reason, "purchase aborted");
            self.state = PurchaseState::Aborted;
        }
    }
}

/// Coordinates the reservation cache and the ledger to sell one unit.
///
/// The orchestrator keeps no state between calls. Every purchase re-reads the
/// reservation and the locked stock. The committed decrement is the source of
/// truth; clearing the reservation afterwards is best-effort and a stale entry
/// expires by TTL.
pub struct PurchaseOrchestrator<L, R>
where
    L: InventoryLedger,
    R: ReservationStore,
{
    ledger: L,
    reservations: R,
    config: PurchaseConfig,
}

impl<L, R> PurchaseOrchestrator<L, R>
where
    L: InventoryLedger,
    R: ReservationStore,
{
    /// Creates an orchestrator with default configuration.
    pub fn new(ledger: L, reservations: R) -> Self {
        Self::with_config(ledger, reservations, PurchaseConfig::default())
    }

    pub fn with_config(ledger: L, reservations: R, config: PurchaseConfig) -> Self {
        Self {
            ledger,
            reservations,
            config,
        }
    }

    pub fn config(&self) -> &PurchaseConfig {
        &self.config
    }

    /// Puts the product in the buyer's cart, refreshing an existing reservation.
    #[tracing::instrument(skip(self, buyer), fields(user_id = %buyer.user_id))]
    pub async fn add_to_cart(&self, product_id: ProductId, buyer: &Identity) -> Result<()> {
        let key = ReservationKey::new(product_id, buyer.user_id);
        self.reservations.put(key, self.config.cart_ttl).await?;
        metrics::counter!("cart_additions_total").increment(1);
        Ok(())
    }

    /// Buys one unit of the product for `buyer`.
    ///
    /// Requires an active cart reservation. The stock check and decrement run
    /// under the product's row lock, so concurrent buyers of the same product
    /// serialize and at most `amount` of them succeed. If the deadline elapses
    /// before the decrement, the in-flight transaction is dropped, which rolls it
    /// back. The commit itself is not bounded by the deadline: once it has been
    /// issued its outcome is awaited, so a committed sale is never reported as a
    /// timeout.
    #[tracing::instrument(skip(self, buyer), fields(user_id = %buyer.user_id))]
    pub async fn buy_product(&self, product_id: ProductId, buyer: &Identity) -> Result<()> {
        metrics::counter!("purchase_attempts_total").increment(1);
        let started = Instant::now();

        let mut progress = Progress::new(ReservationKey::new(product_id, buyer.user_id));
        let prepared = tokio::time::timeout(self.config.deadline, self.prepare(&mut progress)).await;
        let outcome = match prepared {
            Ok(Ok(tx)) => self.commit(tx, &mut progress).await,
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PurchaseError::Timeout(self.config.deadline)),
        };

        metrics::histogram!("purchase_duration_seconds").record(started.elapsed().as_secs_f64());
        let label = match &outcome {
            Ok(()) => "success",
            Err(e) => e.kind(),
        };
        metrics::counter!("purchase_outcomes_total", "outcome" => label).increment(1);

        if let Err(e) = outcome {
            progress.abort(&e);
            tracing::info!(%product_id, error = %e, "purchase rejected");
            return Err(e);
        }

        self.clear_reservation(&mut progress).await;
        tracing::info!(%product_id, state = %progress.state, "purchase completed");
        Ok(())
    }

    /// Reservation check through decrement. Every early return after `begin` rolls
    /// back; on success the transaction is returned still holding the row lock.
    async fn prepare(&self, progress: &mut Progress) -> Result<L::Transaction> {
        let key = progress.key;
        let product_id = key.product_id;

        if !self.reservations.exists(key).await? {
            return Err(PurchaseError::NoReservation {
                product_id,
                user_id: key.user_id,
            });
        }
        progress.advance();

        let mut tx = self.ledger.begin().await?;

        let stock = match tx.lock_and_read_stock(product_id).await {
            Ok(stock) => stock,
            Err(e) => {
                rollback(tx, product_id).await;
                return Err(e.into());
            }
        };
        progress.advance();

        if stock <= 0 {
            rollback(tx, product_id).await;
            return Err(PurchaseError::OutOfStock(product_id));
        }

        if let Err(e) = tx.decrement_stock(product_id, 1).await {
            rollback(tx, product_id).await;
            return Err(PurchaseError::Internal(e));
        }
        progress.advance();

        Ok(tx)
    }

    async fn commit(&self, tx: L::Transaction, progress: &mut Progress) -> Result<()> {
        tx.commit().await.map_err(PurchaseError::Internal)?;
        progress.advance();
        Ok(())
    }

    async fn clear_reservation(&self, progress: &mut Progress) {
        match self.reservations.remove(progress.key).await {
            Ok(()) => progress.advance(),
            Err(e) => {
                metrics::counter!("reservation_cleanup_failures_total").increment(1);
                tracing::warn!(
                    reservation = %progress.key,
                    error = %e,
                    "purchase committed but reservation was not cleared; it will expire by TTL"
                );
            }
        }
    }
}

async fn rollback<T: LedgerTransaction>(tx: T, product_id: ProductId) {
    if let Err(e) = tx.rollback().await {
        // The transaction is gone either way; the connection discards it.
        tracing::warn!(%product_id, error = %e, "rollback failed");
    }
}
