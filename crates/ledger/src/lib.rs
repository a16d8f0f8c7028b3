//! Durable inventory ledger.
//!
//! The ledger owns product rows and is the only writer of stock. Purchases go
//! through a [`LedgerTransaction`] that takes a pessimistic row lock, and partial
//! edits go through statements built by [`build_update`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod product;
pub mod store;
pub mod update;

pub use common::ProductId;
pub use error::{LedgerError, Result, ValidationError};
pub use memory::{InMemoryInventoryLedger, InMemoryLedgerTransaction};
pub use postgres::{PgLedgerTransaction, PostgresInventoryLedger};
pub use product::{NewProduct, Product};
pub use store::{InventoryLedger, LedgerTransaction};
pub use update::{Assignment, Column, FieldValue, ProductPatch, UpdateStatement, build_update};
