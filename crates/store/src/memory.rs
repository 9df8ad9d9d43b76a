use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Money, Order, Product, RatingSummary, Review};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CartStore, CatalogStore, CheckoutStore, OrderStore, StockReservation},
};

#[derive(Default)]
struct Faults {
    fail_on_order_insert: AtomicBool,
    fail_on_decrement: Mutex<Option<ProductId>>,
}

impl Faults {
    fn decrement_fails_for(&self, id: ProductId) -> bool {
        self.fail_on_decrement
            .lock()
            .map(|target| *target == Some(id))
            .unwrap_or(false)
    }
}

/// In-memory store for testing and the demo server.
///
/// Implements every store trait over shared maps. Clones share state.
/// A checkout commit holds the carts, products and orders write locks for
/// its whole duration, so concurrent commits are serialized and a failed
/// commit is undone before any other request can observe it.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    reviews: Arc<RwLock<Vec<Review>>>,
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `products`.
    pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        {
            let mut map = store.products.write().await;
            for product in products {
                map.insert(product.id, product);
            }
        }
        store
    }

    /// Makes subsequent checkout commits fail at the order write, after
    /// stock has been taken.
    pub fn set_fail_on_order_insert(&self, fail: bool) {
        self.faults.fail_on_order_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes stock reservations for `product_id` fail with a backend error.
    /// `None` clears the fault.
    pub fn set_fail_on_decrement(&self, product_id: Option<ProductId>) {
        if let Ok(mut target) = self.faults.fail_on_decrement.lock() {
            *target = product_id;
        }
    }

    /// Overwrites a product's stock, as a sale through another channel or
    /// a restock would.
    pub async fn set_stock(&self, id: ProductId, stock: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.stock = stock;
        Ok(())
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    orders
}

/// Takes `reservation` out of stock if enough is left.
fn take_stock(
    products: &mut HashMap<ProductId, Product>,
    reservation: StockReservation,
) -> Result<()> {
    let StockReservation {
        product_id,
        quantity,
    } = reservation;
    let product = products
        .get_mut(&product_id)
        .ok_or(StoreError::ProductNotFound(product_id))?;

    if product.stock < quantity {
        return Err(StoreError::InsufficientStock {
            product_id,
            requested: quantity,
            available: product.stock,
        });
    }

    product.stock -= quantity;
    Ok(())
}

/// Puts back reservations taken earlier in the same commit.
fn restore_stock(products: &mut HashMap<ProductId, Product>, taken: &[StockReservation]) {
    for reservation in taken.iter().rev() {
        if let Some(product) = products.get_mut(&reservation.product_id) {
            product.stock = product.stock.saturating_add(reservation.quantity);
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn set_price(&self, id: ProductId, price: Money) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.price = price;
        Ok(product.clone())
    }

    async fn add_review(&self, review: Review) -> Result<Product> {
        // Lock order: products, then reviews.
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&review.product_id)
            .ok_or(StoreError::ProductNotFound(review.product_id))?;

        let mut reviews = self.reviews.write().await;
        if reviews
            .iter()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id)
        {
            return Err(StoreError::DuplicateReview {
                user_id: review.user_id,
                product_id: review.product_id,
            });
        }

        let product_id = review.product_id;
        reviews.push(review);

        let summary = RatingSummary::from_ratings(
            reviews
                .iter()
                .filter(|r| r.product_id == product_id)
                .map(|r| r.rating),
        );
        product.apply_rating(summary);
        Ok(product.clone())
    }

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_cart(&self, owner_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&owner_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.carts.write().await.insert(cart.owner_id(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, owner_id: UserId) -> Result<()> {
        self.carts.write().await.remove(&owner_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders_for_user(&self, owner_id: UserId) -> Result<Vec<Order>> {
        let orders = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.owner_id() == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(orders))
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await.values().cloned().collect();
        Ok(newest_first(orders))
    }

    async fn update_order(&self, order: &Order, expected_version: u64) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;

        if stored.version() != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: expected_version,
                actual: stored.version(),
            });
        }

        *stored = order.clone();
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    #[tracing::instrument(skip_all, fields(order_id = %order.id(), owner_id = %order.owner_id()))]
    async fn commit_checkout(&self, order: &Order, cart_updated_at: DateTime<Utc>) -> Result<()> {
        let owner_id = order.owner_id();

        // Lock order: carts, products, orders.
        let mut carts = self.carts.write().await;
        match carts.get(&owner_id) {
            Some(cart) if cart.updated_at() == cart_updated_at => {}
            Some(_) => {
                tracing::warn!("cart changed after it was priced");
                return Err(StoreError::CartChanged(owner_id));
            }
            None => return Err(StoreError::CartNotFound(owner_id)),
        }

        let mut products = self.products.write().await;
        let mut orders = self.orders.write().await;

        let reservations = StockReservation::for_order(order);
        let mut taken = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            let outcome = if self.faults.decrement_fails_for(reservation.product_id) {
                Err(StoreError::Unavailable("stock decrement rejected".to_string()))
            } else {
                take_stock(&mut products, reservation)
            };

            if let Err(e) = outcome {
                tracing::warn!(
                    product_id = %reservation.product_id,
                    quantity = reservation.quantity,
                    error = %e,
                    "stock reservation failed, rolling back"
                );
                restore_stock(&mut products, &taken);
                return Err(e);
            }
            taken.push(reservation);
        }

        if self.faults.fail_on_order_insert.load(Ordering::SeqCst) {
            tracing::warn!("order write failed, rolling back");
            restore_stock(&mut products, &taken);
            return Err(StoreError::Unavailable("order insert rejected".to_string()));
        }

        orders.insert(order.id(), order.clone());
        carts.remove(&owner_id);
        tracing::debug!(products = taken.len(), "checkout committed");
        Ok(())
    }
}
