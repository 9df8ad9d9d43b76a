//! Domain layer for the storefront.
//!
//! Everything in this crate is pure and synchronous: the types know how to
//! validate and transform themselves, while persistence and concurrency are
//! handled by the `store` and `storefront` crates.
//!
//! - [`Cart`] with its running total, validated against live stock
//! - [`Order`] with frozen pricing and the [`OrderStatus`] state machine
//! - [`PricingPolicy`] for subtotal, shipping and tax
//! - [`Review`] and [`RatingSummary`] for product ratings

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod product;
pub mod review;

pub use cart::{Cart, CartItem};
pub use error::DomainError;
pub use money::Money;
pub use order::{Order, OrderItem, OrderPatch, OrderStatus, PaymentStatus, ShippingAddress};
pub use pricing::{PriceBreakdown, PricingPolicy};
pub use product::Product;
pub use review::{NewReview, RatingSummary, Review};
