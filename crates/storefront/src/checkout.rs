//! Cart-to-order conversion.
//!
//! Validation and pricing happen here; the hand-over itself (claiming the
//! cart, reserving stock in product-id order, inserting the order) is one
//! atomic [`CheckoutStore::commit_checkout`]. A failure at any point leaves
//! stock, orders and the cart as they were.

use std::time::Instant;

use common::UserId;
use domain::{DomainError, Order, OrderItem, PricingPolicy, ShippingAddress};
use store::{CartStore, CatalogStore, CatalogStoreExt, CheckoutStore};

use crate::error::{ErrorKind, Result, StorefrontError};

/// Input to [`CheckoutEngine::place_order`].
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    /// Defaults to the mock gateway when absent.
    pub payment_method: Option<String>,
}

/// Converts a user's cart into a priced, immutable order.
#[derive(Clone)]
pub struct CheckoutEngine<S> {
    store: S,
    policy: PricingPolicy,
}

impl<S> CheckoutEngine<S>
where
    S: CatalogStore + CartStore + CheckoutStore,
{
    pub fn new(store: S, policy: PricingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Places an order from the user's current cart.
    ///
    /// Fails with `CartEmpty` (also when the same cart was just checked out by
    /// a parallel request), a validation error for an incomplete address,
    /// `InsufficientStock` naming the first product that ran short, or
    /// `CartChanged` when the cart was edited mid-checkout. None of these
    /// leave stock, orders or the cart modified.
    #[tracing::instrument(skip(self, request))]
    pub async fn place_order(&self, user_id: UserId, request: CheckoutRequest) -> Result<Order> {
        let start = Instant::now();
        let result = self.try_place_order(user_id, request).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    items = order.items().len(),
                    total = %order.total_price(),
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_rejections_total", "reason" => rejection_reason(e))
                    .increment(1);
                if e.kind() == ErrorKind::Storage {
                    tracing::error!(error = %e, "checkout failed");
                } else {
                    tracing::warn!(error = %e, "checkout rejected");
                }
            }
        }

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        result
    }

    async fn try_place_order(&self, user_id: UserId, request: CheckoutRequest) -> Result<Order> {
        // 1. Snapshot the cart. Prices come from the snapshot, not the catalog.
        let cart = self
            .store
            .get_cart(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(DomainError::CartEmpty)?;

        request.shipping_address.validate()?;

        // 2. Stock may have dropped since the items were added.
        let mut items = Vec::with_capacity(cart.item_count());
        for line in cart.items() {
            let product = self.store.require_product(line.product_id).await?;
            product.ensure_stock(line.quantity)?;
            items.push(OrderItem::new(
                product.id,
                product.name,
                line.quantity,
                line.price,
            ));
        }

        // 3-7. Price the order.
        let order = Order::place(
            user_id,
            items,
            request.shipping_address,
            request.payment_method,
            &self.policy,
        )?;

        // 8-9. Reserve stock, persist the order and clear the cart as one unit.
        self.store
            .commit_checkout(&order, cart.updated_at())
            .await?;

        Ok(order)
    }
}

fn rejection_reason(err: &StorefrontError) -> &'static str {
    if err.is_insufficient_stock() {
        return "insufficient_stock";
    }
    match err {
        StorefrontError::Domain(DomainError::CartEmpty) => "cart_empty",
        other => other.kind().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use domain::{Money, OrderStatus, PaymentStatus, Product};
    use store::InMemoryStore;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Ada Lovelace".to_string(),
            street: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country: "UK".to_string(),
            ..Default::default()
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: address(),
            payment_method: None,
        }
    }

    async fn cart_with(store: &InMemoryStore, user: UserId, lines: &[(&Product, u32)]) {
        let mut cart = domain::Cart::new(user);
        for (product, quantity) in lines {
            cart.add_item(product, *quantity).unwrap();
        }
        store.save_cart(&cart).await.unwrap();
    }

    #[tokio::test]
    async fn test_place_order_prices_and_reserves() {
        let product = Product::new("Widget", "W-1", Money::from_dollars(50), 10);
        let store = InMemoryStore::with_products([product.clone()]).await;
        let engine = CheckoutEngine::new(store.clone(), PricingPolicy::default());
        let user = UserId::new();
        cart_with(&store, user, &[(&product, 3)]).await;

        let order = engine.place_order(user, request()).await.unwrap();

        assert_eq!(order.subtotal(), Money::from_dollars(150));
        assert_eq!(order.shipping_cost(), Money::zero());
        assert_eq!(order.tax(), Money::from_dollars(15));
        assert_eq!(order.total_price(), Money::from_dollars(165));
        assert_eq!(order.order_status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.payment_method(), "mock");
        assert_eq!(order.items()[0].name, "Widget");

        assert_eq!(store.require_product(product.id).await.unwrap().stock, 7);
        assert!(store.get_cart(user).await.unwrap().is_none());
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_cart_is_cart_empty() {
        let engine = CheckoutEngine::new(InMemoryStore::new(), PricingPolicy::default());
        let err = engine.place_order(UserId::new(), request()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Domain(DomainError::CartEmpty)));
    }

    #[tokio::test]
    async fn test_incomplete_address_rejected_before_stock_changes() {
        let product = Product::new("Widget", "W-1", Money::from_dollars(5), 10);
        let store = InMemoryStore::with_products([product.clone()]).await;
        let engine = CheckoutEngine::new(store.clone(), PricingPolicy::default());
        let user = UserId::new();
        cart_with(&store, user, &[(&product, 1)]).await;

        let mut req = request();
        req.shipping_address.postal_code = "  ".to_string();
        let err = engine.place_order(user, req).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.require_product(product.id).await.unwrap().stock, 10);
        assert!(store.get_cart(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_explicit_payment_method_is_kept() {
        let product = Product::new("Widget", "W-1", Money::from_dollars(5), 10);
        let store = InMemoryStore::with_products([product.clone()]).await;
        let engine = CheckoutEngine::new(store.clone(), PricingPolicy::default());
        let user = UserId::new();
        cart_with(&store, user, &[(&product, 1)]).await;

        let mut req = request();
        req.payment_method = Some("card".to_string());
        let order = engine.place_order(user, req).await.unwrap();
        assert_eq!(order.payment_method(), "card");
    }

    #[tokio::test]
    async fn test_storage_failure_at_order_write_leaves_stock_and_cart() {
        let product = Product::new("Widget", "W-1", Money::from_dollars(5), 10);
        let store = InMemoryStore::with_products([product.clone()]).await;
        let engine = CheckoutEngine::new(store.clone(), PricingPolicy::default());
        let user = UserId::new();
        cart_with(&store, user, &[(&product, 4)]).await;

        store.set_fail_on_order_insert(true);
        let err = engine.place_order(user, request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(store.require_product(product.id).await.unwrap().stock, 10);
        assert_eq!(store.order_count().await, 0);
        assert!(store.get_cart(user).await.unwrap().is_some());

        // The untouched cart can be retried once storage recovers.
        store.set_fail_on_order_insert(false);
        engine.place_order(user, request()).await.unwrap();
        assert_eq!(store.require_product(product.id).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn test_rejection_reason_labels() {
        assert_eq!(
            rejection_reason(&StorefrontError::Domain(DomainError::CartEmpty)),
            "cart_empty"
        );
        assert_eq!(
            rejection_reason(&StorefrontError::InsufficientStock {
                product_id: ProductId::new(),
                requested: 2,
                available: 1,
            }),
            "insufficient_stock"
        );
        assert_eq!(
            rejection_reason(&StorefrontError::Domain(DomainError::MissingField(
                "shipping_address.city"
            ))),
            "validation"
        );
        assert_eq!(
            rejection_reason(&StorefrontError::CartChanged(UserId::new())),
            "conflict"
        );
    }
}
