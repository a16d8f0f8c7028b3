//! Typed caller identity.
//!
//! The authentication layer resolves a session into an [`Identity`] and hands
//! it to the engine explicitly. Nothing in the engine reads identity from an
//! ambient request context.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserId;

/// Marketplace role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buys products.
    Customer,
    /// Lists and manages their own products.
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is neither `customer` nor `seller`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The acting user of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    /// Shorthand for a customer identity.
    pub fn customer(user_id: UserId, name: impl Into<String>) -> Self {
        let name = name.into();
        let email = format!("{name}@example.com");
        Self::new(user_id, name, email, Role::Customer)
    }

    /// Shorthand for a seller identity.
    pub fn seller(user_id: UserId, name: impl Into<String>) -> Self {
        let name = name.into();
        let email = format!("{name}@example.com");
        Self::new(user_id, name, email, Role::Seller)
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }
}
