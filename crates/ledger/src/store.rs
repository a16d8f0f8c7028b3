use async_trait::async_trait;
use common::Identity;

use crate::{NewProduct, Product, ProductId, Result, UpdateStatement};

/// A unit of work against the ledger holding row locks until it ends.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// every staged change and releases its locks, exactly like [`rollback`](Self::rollback).
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Takes the exclusive row lock on a product and returns its current stock.
    ///
    /// Blocks while another transaction holds the lock on the same product.
    /// Fails with `NotFound` if the product does not exist.
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32>;

    /// Reduces stock of a product locked by this transaction.
    ///
    /// The caller must have verified that the locked amount covers `by`.
    async fn decrement_stock(&mut self, product_id: ProductId, by: i32) -> Result<()>;

    /// Makes staged changes durable and releases the locks.
    async fn commit(self) -> Result<()>;

    /// Discards staged changes and releases the locks.
    async fn rollback(self) -> Result<()>;
}

/// Durable store of product records, the single source of truth for stock.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    type Transaction: LedgerTransaction;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Inserts a product owned by `seller` and returns its id.
    async fn create_product(&self, seller: &Identity, product: NewProduct) -> Result<ProductId>;

    /// Fetches a product. Returns None if it does not exist.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Executes a statement built by [`build_update`](crate::build_update).
    ///
    /// Returns the id of the updated row, or `NotFound` if no row matched.
    async fn apply_partial_update(&self, statement: &UpdateStatement) -> Result<ProductId>;

    /// Removes a product. Fails with `NotFound` if it does not exist.
    async fn delete_product(&self, product_id: ProductId) -> Result<()>;
}
