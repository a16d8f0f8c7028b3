use std::time::Instant;

use async_trait::async_trait;
use common::{Identity, UserId};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    FieldValue, LedgerError, NewProduct, Product, ProductId, Result, UpdateStatement,
    store::{InventoryLedger, LedgerTransaction},
};

const PRODUCT_COLUMNS: &str = "id, title, seller_name, seller_id, product_description, product_image, price, amount, created_at, updated_at";

/// PostgreSQL-backed ledger implementation.
#[derive(Clone)]
pub struct PostgresInventoryLedger {
    pool: PgPool,
}

impl PostgresInventoryLedger {
    /// Creates a new PostgreSQL ledger over an injected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            seller_name: row.try_get("seller_name")?,
            seller_id: UserId::new(row.try_get("seller_id")?),
            description: row.try_get("product_description")?,
            image: row.try_get("product_image")?,
            price: row.try_get("price")?,
            amount: row.try_get("amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryLedger for PostgresInventoryLedger {
    type Transaction = PgLedgerTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerTransaction { tx })
    }

    async fn create_product(&self, seller: &Identity, product: NewProduct) -> Result<ProductId> {
        product.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products
                (title, seller_name, seller_id, product_image, product_description, price, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(&product.title)
        .bind(&seller.name)
        .bind(seller.user_id.as_i64())
        .bind(&product.image)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(product_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn apply_partial_update(&self, statement: &UpdateStatement) -> Result<ProductId> {
        let sql = statement.sql();
        let mut query = sqlx::query_scalar::<Postgres, i64>(&sql);

        for assignment in statement.assignments() {
            query = match &assignment.value {
                FieldValue::Text(value) => query.bind(value.as_str()),
                FieldValue::BigInt(value) => query.bind(*value),
                FieldValue::Int(value) => query.bind(*value),
            };
        }

        let updated: Option<i64> = query
            .bind(statement.product_id().as_i64())
            .fetch_optional(&self.pool)
            .await?;

        updated
            .map(ProductId::new)
            .ok_or(LedgerError::NotFound(statement.product_id()))
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(product_id));
        }
        Ok(())
    }
}

/// A PostgreSQL transaction. Dropping it without commit rolls back.
pub struct PgLedgerTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32> {
        let started = Instant::now();
        let amount: Option<i32> =
            sqlx::query_scalar("SELECT amount FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;
        metrics::histogram!("ledger_row_lock_wait_seconds").record(started.elapsed().as_secs_f64());

        amount.ok_or(LedgerError::NotFound(product_id))
    }

    async fn decrement_stock(&mut self, product_id: ProductId, by: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET amount = amount - $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(product_id.as_i64())
        .bind(by)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(product_id));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
