//! Seller-side product edits with ownership enforced inside the engine.

use common::{Identity, ProductId};
use ledger::{InventoryLedger, NewProduct, Product, ProductPatch, build_update};

use crate::error::{PurchaseError, Result};

/// Service for creating, editing and removing products.
///
/// Ownership is checked here rather than left to callers: only the seller who
/// listed a product may change or delete it.
pub struct CatalogService<L: InventoryLedger> {
    ledger: L,
}

impl<L: InventoryLedger> CatalogService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Lists a new product owned by `seller`.
    #[tracing::instrument(skip(self, product, seller), fields(user_id = %seller.user_id))]
    pub async fn create_product(&self, product: NewProduct, seller: &Identity) -> Result<ProductId> {
        if !seller.is_seller() {
            return Err(PurchaseError::Forbidden(format!(
                "user {} is not a seller",
                seller.user_id
            )));
        }
        let id = self.ledger.create_product(seller, product).await?;
        tracing::info!(product_id = %id, "product created");
        Ok(id)
    }

    /// Fetches a product by id.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.ledger
            .get_product(product_id)
            .await?
            .ok_or(PurchaseError::NotFound(product_id))
    }

    /// Applies a partial update on behalf of `requester`.
    ///
    /// The statement is built before any I/O, so an empty or invalid patch never
    /// reaches the ledger.
    #[tracing::instrument(skip(self, patch, requester), fields(user_id = %requester.user_id))]
    pub async fn update_product(
        &self,
        patch: &ProductPatch,
        product_id: ProductId,
        requester: &Identity,
    ) -> Result<ProductId> {
        let statement = build_update(patch, product_id)?;

        let product = self.get_product(product_id).await?;
        ensure_owner(&product, requester)?;

        let updated = self.ledger.apply_partial_update(&statement).await?;
        metrics::counter!("product_updates_total").increment(1);
        tracing::info!(
            product_id = %updated,
            fields = statement.assignments().len(),
            "product updated"
        );
        Ok(updated)
    }

    /// Deletes a product on behalf of `requester`.
    #[tracing::instrument(skip(self, requester), fields(user_id = %requester.user_id))]
    pub async fn delete_product(&self, product_id: ProductId, requester: &Identity) -> Result<()> {
        let product = self.get_product(product_id).await?;
        ensure_owner(&product, requester)?;

        self.ledger.delete_product(product_id).await?;
        tracing::info!(%product_id, "product deleted");
        Ok(())
    }
}

fn ensure_owner(product: &Product, requester: &Identity) -> Result<()> {
    if product.seller_id != requester.user_id {
        return Err(PurchaseError::Forbidden(format!(
            "user {} does not own product {}",
            requester.user_id, product.id
        )));
    }
    Ok(())
}
