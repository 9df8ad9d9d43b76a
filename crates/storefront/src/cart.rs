//! Per-user cart management.

use common::{ProductId, UserId};
use domain::Cart;
use store::{CartStore, CatalogStore, CatalogStoreExt};

use crate::error::Result;

/// Owns each user's cart and validates mutations against live stock.
///
/// Every mutation loads the stored cart (or starts an empty one), applies the
/// change through the domain model, which recomputes the total, and saves the
/// result. A cart only exists in the store after its first mutation.
#[derive(Clone)]
pub struct CartManager<S> {
    store: S,
}

impl<S> CartManager<S>
where
    S: CatalogStore + CartStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, or an empty unsaved one.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart> {
        Ok(self
            .store
            .get_cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id)))
    }

    /// Adds `quantity` of a product, snapshotting its current price on a new
    /// line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let product = self.store.require_product(product_id).await?;
        let mut cart = self.get_or_create(user_id).await?;

        cart.add_item(&product, quantity)?;
        self.save(&cart, "add").await?;

        tracing::debug!(
            items = cart.item_count(),
            total = %cart.total_price(),
            "item added to cart"
        );
        Ok(cart)
    }

    /// Sets a line's quantity; zero removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self.get_or_create(user_id).await?;

        let product = if quantity == 0 {
            None
        } else {
            self.store.get_product(product_id).await?
        };

        cart.update_item(product_id, quantity, product.as_ref())?;
        self.save(&cart, "update").await?;
        Ok(cart)
    }

    /// Removes a line. Removing an absent product is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> Result<Cart> {
        let mut cart = self.get_or_create(user_id).await?;
        cart.remove_item(product_id);
        self.save(&cart, "remove").await?;
        Ok(cart)
    }

    /// Empties the cart by dropping it from the store.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        self.store.delete_cart(user_id).await?;
        metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        Ok(Cart::new(user_id))
    }

    async fn save(&self, cart: &Cart, op: &'static str) -> Result<()> {
        self.store.save_cart(cart).await?;
        metrics::counter!("cart_mutations_total", "op" => op).increment(1);
        Ok(())
    }
}
