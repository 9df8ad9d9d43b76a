use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Money, Order, Product, Review};

use crate::{Result, StoreError};

/// Catalog access needed by the storefront core.
///
/// Product CRUD lives in the catalog service; this port covers reads, the
/// stock counter and review aggregation.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Retrieves a product, or None if it doesn't exist.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a product. Used for seeding and tests.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Changes a product's list price. Existing cart lines and orders keep
    /// their snapshot prices.
    async fn set_price(&self, id: ProductId, price: Money) -> Result<Product>;

    /// Stores a review and refreshes the product's rating and review count
    /// in one step.
    ///
    /// Fails with `DuplicateReview` if the user already reviewed the product.
    async fn add_review(&self, review: Review) -> Result<Product>;

    /// Lists reviews for a product, oldest first.
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>>;
}

/// Extension trait providing convenience methods for catalog stores.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Retrieves a product, failing with `ProductNotFound` if it is missing.
    async fn require_product(&self, id: ProductId) -> Result<Product> {
        self.get_product(id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}

/// Per-user cart persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads a user's cart, or None if they never mutated one.
    async fn get_cart(&self, owner_id: UserId) -> Result<Option<Cart>>;

    /// Replaces the stored cart for its owner.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    /// Removes a user's cart. Missing carts are not an error.
    async fn delete_cart(&self, owner_id: UserId) -> Result<()>;
}

/// Order persistence. Orders are created only through
/// [`CheckoutStore::commit_checkout`] and never deleted.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Retrieves an order, or None if it doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, owner_id: UserId) -> Result<Vec<Order>>;

    /// Lists every order, newest first.
    async fn list_all_orders(&self) -> Result<Vec<Order>>;

    /// Writes back a mutated order if the stored version still equals
    /// `expected_version`; otherwise fails with `ConcurrencyConflict`.
    async fn update_order(&self, order: &Order, expected_version: u64) -> Result<()>;
}

/// Stock taken from one product when an order commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockReservation {
    /// Merges an order's lines per product, in ascending product-id order.
    ///
    /// Every store applies reservations in this order, so two checkouts
    /// sharing products always lock them in the same sequence.
    pub fn for_order(order: &Order) -> Vec<Self> {
        let mut wanted: BTreeMap<ProductId, u32> = BTreeMap::new();
        for item in order.items() {
            let quantity = wanted.entry(item.product_id).or_default();
            *quantity = quantity.saturating_add(item.quantity);
        }
        wanted
            .into_iter()
            .map(|(product_id, quantity)| Self {
                product_id,
                quantity,
            })
            .collect()
    }
}

/// Atomic hand-over from cart to order.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Commits a placed order as one indivisible unit:
    ///
    /// 1. claims the owner's cart, which must still carry `cart_updated_at`,
    /// 2. applies a conditional stock decrement for every
    ///    [`StockReservation::for_order`] entry,
    /// 3. inserts the order and removes the cart.
    ///
    /// Either all of it becomes visible or none of it does. Fails with
    /// `CartNotFound` when the cart is gone (already checked out),
    /// `CartChanged` when it was edited after being priced, and
    /// `InsufficientStock` or `ProductNotFound` naming the first product
    /// that could not be reserved.
    async fn commit_checkout(&self, order: &Order, cart_updated_at: DateTime<Utc>) -> Result<()>;
}
