//! Shared identifiers and caller context used across the storefront crates.

pub mod auth;
pub mod types;

pub use auth::{Requester, Role};
pub use types::{OrderId, ProductId, UserId};
