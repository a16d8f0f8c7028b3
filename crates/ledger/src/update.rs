//! Sparse product updates.
//!
//! A [`ProductPatch`] names the fields a caller wants to change. [`build_update`]
//! turns it into an [`UpdateStatement`]: an ordered list of column assignments plus
//! the id predicate. Values are always carried as bound parameters, the SQL text
//! only ever contains column names and `$n` placeholders.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Columns a partial update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Description,
    Image,
    Price,
    Amount,
}

impl Column {
    /// Order in which assignments are emitted, independent of how the patch was built.
    pub const CANONICAL_ORDER: [Column; 5] = [
        Column::Title,
        Column::Description,
        Column::Image,
        Column::Price,
        Column::Amount,
    ];

    /// Column name in the `products` table.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Description => "product_description",
            Column::Image => "product_image",
            Column::Price => "price",
            Column::Amount => "amount",
        }
    }

    /// Field name as seen by API callers.
    pub fn field_name(&self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Description => "description",
            Column::Image => "image",
            Column::Price => "price",
            Column::Amount => "amount",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    BigInt(i64),
    Int(i32),
}

/// One `column = $n` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: Column,
    pub value: FieldValue,
}

/// Requested changes to a product.
///
/// `None` leaves a field untouched and `Some` sets it, so an explicit zero or empty
/// string is distinguishable from an omitted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i32>,
}

impl ProductPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn amount(mut self, amount: i32) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        Column::CANONICAL_ORDER
            .iter()
            .all(|column| self.value_of(*column).is_none())
    }

    fn value_of(&self, column: Column) -> Option<FieldValue> {
        match column {
            Column::Title => self.title.clone().map(FieldValue::Text),
            Column::Description => self.description.clone().map(FieldValue::Text),
            Column::Image => self.image.clone().map(FieldValue::Text),
            Column::Price => self.price.map(FieldValue::BigInt),
            Column::Amount => self.amount.map(FieldValue::Int),
        }
    }
}

/// A parameterized partial update of a single product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    product_id: ProductId,
    assignments: Vec<Assignment>,
}

impl UpdateStatement {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Assignments in canonical column order. Never empty.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Renders the statement text. Parameters `$1..$n` are the assignments in order,
    /// `$n+1` is the product id.
    pub fn sql(&self) -> String {
        let mut sql = String::from("UPDATE products SET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            sql.push_str(&format!("{} = ${}, ", assignment.column.as_sql(), i + 1));
        }
        sql.push_str(&format!(
            "updated_at = NOW() WHERE id = ${} RETURNING id",
            self.assignments.len() + 1
        ));
        sql
    }
}

/// Builds the update statement for `patch` against `product_id`.
///
/// Fails with [`ValidationError::NothingToUpdate`] when the patch is empty, and with
/// [`ValidationError::InvalidField`] when a present value would break a product
/// invariant. Performs no I/O.
pub fn build_update(
    patch: &ProductPatch,
    product_id: ProductId,
) -> Result<UpdateStatement, ValidationError> {
    let mut assignments = Vec::with_capacity(Column::CANONICAL_ORDER.len());

    for column in Column::CANONICAL_ORDER {
        if let Some(value) = patch.value_of(column) {
            validate(column, &value)?;
            assignments.push(Assignment { column, value });
        }
    }

    if assignments.is_empty() {
        return Err(ValidationError::NothingToUpdate);
    }

    Ok(UpdateStatement {
        product_id,
        assignments,
    })
}

fn validate(column: Column, value: &FieldValue) -> Result<(), ValidationError> {
    let reason = match (column, value) {
        (Column::Title, FieldValue::Text(t)) if t.trim().is_empty() => "must not be empty",
        (Column::Price, FieldValue::BigInt(p)) if *p <= 0 => "must be positive",
        (Column::Amount, FieldValue::Int(a)) if *a < 0 => "must not be negative",
        _ => return Ok(()),
    };
    Err(ValidationError::InvalidField {
        field: column.field_name(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_rejected() {
        let result = build_update(&ProductPatch::new(), ProductId::new(1));
        assert_eq!(result, Err(ValidationError::NothingToUpdate));
        assert!(ProductPatch::new().is_empty());
    }

    #[test]
    fn assignments_follow_canonical_order() {
        // Built price-first on purpose.
        let patch = ProductPatch::new().price(200).title("X");
        let statement = build_update(&patch, ProductId::new(5)).unwrap();

        assert_eq!(
            statement.assignments(),
            &[
                Assignment {
                    column: Column::Title,
                    value: FieldValue::Text("X".to_string()),
                },
                Assignment {
                    column: Column::Price,
                    value: FieldValue::BigInt(200),
                },
            ]
        );
        assert_eq!(
            statement.sql(),
            "UPDATE products SET title = $1, price = $2, updated_at = NOW() WHERE id = $3 RETURNING id"
        );
        assert_eq!(statement.product_id(), ProductId::new(5));
    }

    #[test]
    fn all_fields_render_in_order() {
        let patch = ProductPatch::new()
            .amount(3)
            .image("a.png")
            .price(10)
            .description("d")
            .title("t");
        let statement = build_update(&patch, ProductId::new(1)).unwrap();
        let columns: Vec<_> = statement.assignments().iter().map(|a| a.column).collect();
        assert_eq!(columns, Column::CANONICAL_ORDER.to_vec());
        assert!(statement.sql().contains("amount = $5"));
        assert!(statement.sql().ends_with("WHERE id = $6 RETURNING id"));
    }

    #[test]
    fn values_never_appear_in_sql_text() {
        let patch = ProductPatch::new().title("'; DROP TABLE products; --");
        let statement = build_update(&patch, ProductId::new(1)).unwrap();
        assert!(!statement.sql().contains("DROP"));
    }

    #[test]
    fn explicit_zero_amount_is_an_update() {
        let statement = build_update(&ProductPatch::new().amount(0), ProductId::new(1)).unwrap();
        assert_eq!(statement.assignments()[0].value, FieldValue::Int(0));
    }

    #[test]
    fn explicit_empty_description_is_an_update() {
        let statement =
            build_update(&ProductPatch::new().description(""), ProductId::new(1)).unwrap();
        assert_eq!(statement.assignments().len(), 1);
    }

    #[test]
    fn invariant_breaking_values_are_rejected() {
        let cases = [
            (ProductPatch::new().price(0), "price"),
            (ProductPatch::new().amount(-1), "amount"),
            (ProductPatch::new().title(""), "title"),
        ];
        for (patch, expected) in cases {
            match build_update(&patch, ProductId::new(1)) {
                Err(ValidationError::InvalidField { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidField for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn patch_deserializes_absent_fields_as_none() {
        let patch: ProductPatch = serde_json::from_str(r#"{"price": 0}"#).unwrap();
        assert_eq!(patch.price, Some(0));
        assert!(patch.title.is_none());
        assert!(patch.amount.is_none());
    }
}
