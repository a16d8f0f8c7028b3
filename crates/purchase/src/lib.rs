//! Purchase-consistency engine.
//!
//! [`PurchaseOrchestrator`] sells one unit of a product to a user who holds a
//! cart reservation. It sequences two stores:
//! 1. Check the reservation in the cache
//! 2. Lock the product row and read stock
//! 3. Decrement and commit in the ledger
//! 4. Clear the reservation, best-effort
//!
//! Any failure before commit rolls the ledger transaction back.
//! [`CatalogService`] handles seller edits and enforces product ownership.

pub mod catalog;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use catalog::CatalogService;
pub use error::{PurchaseError, Result};
pub use orchestrator::{DEFAULT_DEADLINE, PurchaseConfig, PurchaseOrchestrator};
pub use state::PurchaseState;
