use common::{OrderId, ProductId, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement would have made stock negative.
    /// Stock is left unchanged.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The user already reviewed this product.
    #[error("User {user_id} has already reviewed product {product_id}")]
    DuplicateReview {
        user_id: UserId,
        product_id: ProductId,
    },

    /// The user has no cart to check out.
    #[error("Cart not found for user {0}")]
    CartNotFound(UserId),

    /// The cart was modified after it was priced for checkout.
    #[error("Cart for user {0} changed during checkout")]
    CartChanged(UserId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order changed since it was loaded.
    #[error("Concurrency conflict for order {order_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be mapped back into the domain.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backend rejected the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
