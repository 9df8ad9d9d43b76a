//! Read access to catalog products.

use common::ProductId;
use domain::Product;
use store::{CatalogStore, CatalogStoreExt};

use crate::error::Result;

/// Catalog lookups needed by the storefront surface. Product CRUD is owned by
/// the catalog service.
#[derive(Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S: CatalogStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        Ok(self.store.require_product(product_id).await?)
    }
}
