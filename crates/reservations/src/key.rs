use common::{ProductId, UserId};

/// Default lifetime of a cart reservation.
pub const DEFAULT_CART_TTL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

const CART_PREFIX: &str = "cart";

/// Identifies the reservation "user has product in cart".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservationKey {
    pub product_id: ProductId,
    pub user_id: UserId,
}

impl ReservationKey {
    pub fn new(product_id: ProductId, user_id: UserId) -> Self {
        Self {
            product_id,
            user_id,
        }
    }

    /// Cache key in the `cart_{user}_{product}` layout.
    pub fn cache_key(&self) -> String {
        format!("{CART_PREFIX}_{}_{}", self.user_id, self.product_id)
    }
}

impl std::fmt::Display for ReservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_puts_user_before_product() {
        let key = ReservationKey::new(ProductId::new(7), UserId::new(3));
        assert_eq!(key.cache_key(), "cart_3_7");
        assert_eq!(key.to_string(), "cart_3_7");
    }

    #[test]
    fn default_ttl_is_one_hour() {
        assert_eq!(DEFAULT_CART_TTL.as_secs(), 3600);
    }
}
