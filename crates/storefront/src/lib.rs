//! Storefront core services.
//!
//! - [`CartManager`]: per-user carts validated against live stock.
//! - [`CheckoutEngine`]: all-or-nothing cart-to-order conversion.
//! - [`OrderLifecycle`]: status state machine and cancellation.
//! - [`ReviewService`]: one review per user per product.
//!
//! [`Storefront`] wires all of them to a single store.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod reviews;

pub use cart::CartManager;
pub use catalog::Catalog;
pub use checkout::{CheckoutEngine, CheckoutRequest};
pub use error::{ErrorKind, Result, StorefrontError};
pub use lifecycle::{OrderLifecycle, OrderOverview, OrderStats, StatusUpdate};
pub use reviews::{ReviewOutcome, ReviewService};

use domain::PricingPolicy;
use store::{CartStore, CatalogStore, CheckoutStore, OrderStore};

/// A store that backs every storefront service.
pub trait StorefrontStore:
    CatalogStore + CartStore + OrderStore + CheckoutStore + Clone + 'static
{
}

impl<T> StorefrontStore for T where
    T: CatalogStore + CartStore + OrderStore + CheckoutStore + Clone + 'static
{
}

/// All storefront services sharing one store.
#[derive(Clone)]
pub struct Storefront<S> {
    pub catalog: Catalog<S>,
    pub carts: CartManager<S>,
    pub checkout: CheckoutEngine<S>,
    pub orders: OrderLifecycle<S>,
    pub reviews: ReviewService<S>,
}

impl<S: StorefrontStore> Storefront<S> {
    pub fn new(store: S, policy: PricingPolicy) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            carts: CartManager::new(store.clone()),
            checkout: CheckoutEngine::new(store.clone(), policy),
            orders: OrderLifecycle::new(store.clone()),
            reviews: ReviewService::new(store),
        }
    }
}
