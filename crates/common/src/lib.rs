//! Shared types for the marketplace purchase engine.

pub mod identity;
pub mod types;

pub use identity::{Identity, Role, UnknownRole};
pub use types::{ProductId, UserId};
