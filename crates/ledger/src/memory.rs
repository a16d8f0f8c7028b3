use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::Identity;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    LedgerError, NewProduct, Product, ProductId, Result, UpdateStatement,
    store::{InventoryLedger, LedgerTransaction},
};

/// A product row guarded by its own lock, standing in for a pessimistic row lock.
type Row = Arc<Mutex<Product>>;
type Rows = Arc<RwLock<BTreeMap<ProductId, Row>>>;

#[derive(Debug, Default)]
struct Faults {
    fail_on_decrement: AtomicBool,
    fail_after_decrement: AtomicBool,
    fail_on_commit: AtomicBool,
}

/// In-memory ledger implementation for testing.
///
/// Each product sits behind its own mutex. A transaction holds the mutex from
/// `lock_and_read_stock` until it commits, rolls back or is dropped, so purchases of
/// the same product serialize while different products proceed in parallel.
/// Decrements are written into the locked row immediately and undone on rollback.
#[derive(Clone, Default)]
pub struct InMemoryInventoryLedger {
    rows: Rows,
    next_id: Arc<AtomicI64>,
    faults: Arc<Faults>,
}

impl InMemoryInventoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `decrement_stock` call fail.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.faults.fail_on_decrement.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `decrement_stock` call apply the decrement to the
    /// locked row and then report failure, leaving the change for rollback to undo.
    pub fn set_fail_after_decrement(&self, fail: bool) {
        self.faults.fail_after_decrement.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `commit` call fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.faults.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the committed stock of a product, waiting for any row lock on it.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<i32> {
        let row = self.row(product_id).await?;
        let amount = row.lock().await.amount;
        Some(amount)
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.rows.read().await.len()
    }

    async fn row(&self, product_id: ProductId) -> Option<Row> {
        self.rows.read().await.get(&product_id).cloned()
    }
}

/// Returns true if `row` is still the live row for `product_id`.
async fn is_current(rows: &Rows, product_id: ProductId, row: &Row) -> bool {
    rows.read()
        .await
        .get(&product_id)
        .is_some_and(|current| Arc::ptr_eq(current, row))
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    type Transaction = InMemoryLedgerTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(InMemoryLedgerTransaction {
            rows: self.rows.clone(),
            faults: self.faults.clone(),
            locked: HashMap::new(),
        })
    }

    async fn create_product(&self, seller: &Identity, product: NewProduct) -> Result<ProductId> {
        product.validate()?;
        let id = ProductId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let row = Product::from_new(id, seller, product);
        self.rows.write().await.insert(id, Arc::new(Mutex::new(row)));
        Ok(id)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        match self.row(product_id).await {
            Some(row) => Ok(Some(row.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn apply_partial_update(&self, statement: &UpdateStatement) -> Result<ProductId> {
        let product_id = statement.product_id();
        let row = self
            .row(product_id)
            .await
            .ok_or(LedgerError::NotFound(product_id))?;

        let mut product = row.lock().await;
        if !is_current(&self.rows, product_id, &row).await {
            return Err(LedgerError::NotFound(product_id));
        }
        for assignment in statement.assignments() {
            product.apply(assignment);
        }
        product.updated_at = Utc::now();
        Ok(product_id)
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<()> {
        let row = self
            .row(product_id)
            .await
            .ok_or(LedgerError::NotFound(product_id))?;

        // Deleting waits for the row lock, as a DELETE would in the database.
        let _guard = row.lock().await;
        let mut rows = self.rows.write().await;
        let live = rows
            .get(&product_id)
            .is_some_and(|current| Arc::ptr_eq(current, &row));
        if !live {
            return Err(LedgerError::NotFound(product_id));
        }
        rows.remove(&product_id);
        Ok(())
    }
}

struct LockedRow {
    guard: OwnedMutexGuard<Product>,
    /// Amount when the lock was taken; restored unless the transaction commits.
    original_amount: i32,
}

impl Drop for LockedRow {
    fn drop(&mut self) {
        self.guard.amount = self.original_amount;
    }
}

/// Transaction over [`InMemoryInventoryLedger`].
///
/// Other transactions cannot observe uncommitted amounts because the row stays
/// locked until the transaction ends.
pub struct InMemoryLedgerTransaction {
    rows: Rows,
    faults: Arc<Faults>,
    locked: HashMap<ProductId, LockedRow>,
}

#[async_trait]
impl LedgerTransaction for InMemoryLedgerTransaction {
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32> {
        if let Some(locked) = self.locked.get(&product_id) {
            return Ok(locked.guard.amount);
        }

        let row = self
            .rows
            .read()
            .await
            .get(&product_id)
            .cloned()
            .ok_or(LedgerError::NotFound(product_id))?;

        let guard = row.clone().lock_owned().await;
        // The row may have been deleted while we waited for the lock.
        if !is_current(&self.rows, product_id, &row).await {
            return Err(LedgerError::NotFound(product_id));
        }

        let amount = guard.amount;
        self.locked.insert(
            product_id,
            LockedRow {
                guard,
                original_amount: amount,
            },
        );
        Ok(amount)
    }

    async fn decrement_stock(&mut self, product_id: ProductId, by: i32) -> Result<()> {
        if self.faults.fail_on_decrement.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable(
                "simulated decrement failure".to_string(),
            ));
        }

        let locked = self
            .locked
            .get_mut(&product_id)
            .ok_or(LedgerError::NotLocked(product_id))?;

        if locked.guard.amount < by {
            return Err(LedgerError::InsufficientStock {
                product_id,
                available: locked.guard.amount,
                requested: by,
            });
        }
        locked.guard.amount -= by;

        if self.faults.fail_after_decrement.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable(
                "simulated failure after decrement".to_string(),
            ));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        if self.faults.fail_on_commit.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable(
                "simulated commit failure".to_string(),
            ));
        }

        let now = Utc::now();
        for (_, mut locked) in self.locked {
            if locked.guard.amount != locked.original_amount {
                locked.original_amount = locked.guard.amount;
                locked.guard.updated_at = now;
            }
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        drop(self.locked);
        Ok(())
    }
}
