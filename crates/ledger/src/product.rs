use chrono::{DateTime, Utc};
use common::{Identity, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::update::{Assignment, Column, FieldValue};

/// A product row as stored in the ledger.
///
/// `amount` never drops below zero. Only the ledger mutates it, either under the
/// row lock during a purchase or through a validated partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub seller_name: String,
    pub seller_id: UserId,
    pub description: String,
    pub image: String,
    /// Price in currency minor units.
    pub price: i64,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a row from a creation request owned by `seller`.
    pub(crate) fn from_new(id: ProductId, seller: &Identity, new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            seller_name: seller.name.clone(),
            seller_id: seller.user_id,
            description: new.description,
            image: new.image,
            price: new.price,
            amount: new.amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes one builder assignment into the row.
    pub(crate) fn apply(&mut self, assignment: &Assignment) {
        match (assignment.column, &assignment.value) {
            (Column::Title, FieldValue::Text(v)) => self.title = v.clone(),
            (Column::Description, FieldValue::Text(v)) => self.description = v.clone(),
            (Column::Image, FieldValue::Text(v)) => self.image = v.clone(),
            (Column::Price, FieldValue::BigInt(v)) => self.price = *v,
            (Column::Amount, FieldValue::Int(v)) => self.amount = *v,
            (column, value) => {
                tracing::warn!(%column, ?value, "ignoring assignment with mismatched value type");
            }
        }
    }
}

/// Request to list a new product. Seller fields come from the caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    pub price: i64,
    pub amount: i32,
}

impl NewProduct {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        price: i64,
        amount: i32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image: image.into(),
            price,
            amount,
        }
    }

    /// A new listing needs a title, an image, a positive price and some stock.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "title",
                reason: "must not be empty",
            });
        }
        if self.image.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "image",
                reason: "must not be empty",
            });
        }
        if self.price <= 0 {
            return Err(ValidationError::InvalidField {
                field: "price",
                reason: "must be positive",
            });
        }
        if self.amount <= 0 {
            return Err(ValidationError::InvalidField {
                field: "amount",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> NewProduct {
        NewProduct::new("Lamp", "Desk lamp", "lamp.png", 1500, 4)
    }

    #[test]
    fn valid_listing_passes() {
        assert!(listing().validate().is_ok());
    }

    #[test]
    fn listing_requires_title_and_image() {
        let mut p = listing();
        p.title = "  ".to_string();
        assert!(matches!(
            p.validate(),
            Err(ValidationError::InvalidField { field: "title", .. })
        ));

        let mut p = listing();
        p.image.clear();
        assert!(matches!(
            p.validate(),
            Err(ValidationError::InvalidField { field: "image", .. })
        ));
    }

    #[test]
    fn listing_requires_positive_price_and_amount() {
        let mut p = listing();
        p.price = 0;
        assert!(p.validate().is_err());

        let mut p = listing();
        p.amount = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn description_defaults_to_empty() {
        let json = r#"{"title":"Lamp","image":"lamp.png","price":10,"amount":1}"#;
        let p: NewProduct = serde_json::from_str(json).unwrap();
        assert_eq!(p.description, "");
    }

    #[test]
    fn from_new_takes_seller_from_identity() {
        let seller = Identity::seller(UserId::new(9), "maria");
        let product = Product::from_new(ProductId::new(1), &seller, listing());
        assert_eq!(product.seller_id, UserId::new(9));
        assert_eq!(product.seller_name, "maria");
        assert_eq!(product.amount, 4);
    }

    #[test]
    fn apply_writes_matching_column() {
        let seller = Identity::seller(UserId::new(9), "maria");
        let mut product = Product::from_new(ProductId::new(1), &seller, listing());
        product.apply(&Assignment {
            column: Column::Price,
            value: FieldValue::BigInt(99),
        });
        product.apply(&Assignment {
            column: Column::Title,
            value: FieldValue::Text("Floor lamp".to_string()),
        });
        assert_eq!(product.price, 99);
        assert_eq!(product.title, "Floor lamp");
    }
}
