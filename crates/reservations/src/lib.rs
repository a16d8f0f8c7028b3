//! Cart reservations.
//!
//! A reservation marks that a user has put a product in their cart. It gates a
//! purchase attempt but never holds stock, and it expires on its own.

pub mod error;
pub mod key;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{ReservationError, Result};
pub use key::{DEFAULT_CART_TTL, ReservationKey};
pub use memory::InMemoryReservationStore;
pub use redis_store::RedisReservationStore;
pub use store::ReservationStore;
