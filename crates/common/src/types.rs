use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a store-assigned row id.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw id as bound into SQL statements.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Identifier of a product row.
    ///
    /// Assigned by the ledger on creation and never changed afterwards.
    ProductId
);

row_id!(
    /// Identifier of a marketplace user, either a buyer or the seller owning a product.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_preserves_value() {
        let id = ProductId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn ids_display_as_plain_integers() {
        assert_eq!(ProductId::new(7).to_string(), "7");
        assert_eq!(UserId::new(-1).to_string(), "-1");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&UserId::new(15)).unwrap();
        assert_eq!(json, "15");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(15));
    }
}
