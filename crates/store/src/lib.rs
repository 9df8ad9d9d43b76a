//! Persistence for the storefront.
//!
//! The [`CatalogStore`], [`CartStore`], [`OrderStore`] and [`CheckoutStore`]
//! traits are the ports the services depend on. [`InMemoryStore`] backs tests and the demo
//! binary; [`PostgresStore`] is the production implementation.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    CartStore, CatalogStore, CatalogStoreExt, CheckoutStore, OrderStore, StockReservation,
};
