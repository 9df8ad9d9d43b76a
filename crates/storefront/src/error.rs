//! Storefront error types.

use common::{OrderId, ProductId, UserId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`StorefrontError`], used by transports to
/// pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// Well-formed input the current state forbids.
    BusinessRule,
    /// Caller is neither the owner nor an admin.
    Authorization,
    /// Missing product, order or cart line.
    NotFound,
    /// Lost an optimistic concurrency race.
    Conflict,
    /// Backend failure.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Errors that can occur in storefront operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Stock ran out between validation and reservation.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The user already reviewed this product.
    #[error("You have already reviewed this product")]
    DuplicateReview {
        user_id: UserId,
        product_id: ProductId,
    },

    /// The caller may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    /// The cart was edited while it was being checked out.
    #[error("Cart changed during checkout, review it and try again")]
    CartChanged(UserId),

    /// The order was modified by another request.
    #[error("Order {0} was modified concurrently, reload and retry")]
    Conflict(OrderId),

    /// Store error.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl StorefrontError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorefrontError::Domain(DomainError::ItemNotFound(_) | DomainError::ProductNotFound(_)) => {
                ErrorKind::NotFound
            }
            StorefrontError::Domain(e) if e.is_validation() => ErrorKind::Validation,
            StorefrontError::Domain(_) => ErrorKind::BusinessRule,
            StorefrontError::ProductNotFound(_) | StorefrontError::OrderNotFound(_) => {
                ErrorKind::NotFound
            }
            StorefrontError::InsufficientStock { .. } | StorefrontError::DuplicateReview { .. } => {
                ErrorKind::BusinessRule
            }
            StorefrontError::Forbidden(_) => ErrorKind::Authorization,
            StorefrontError::Conflict(_) | StorefrontError::CartChanged(_) => ErrorKind::Conflict,
            StorefrontError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if stock was short, whether caught by validation or by
    /// the conditional decrement.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(
            self,
            StorefrontError::InsufficientStock { .. }
                | StorefrontError::Domain(DomainError::InsufficientStock { .. })
        )
    }
}

impl From<StoreError> for StorefrontError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => StorefrontError::ProductNotFound(id),
            StoreError::OrderNotFound(id) => StorefrontError::OrderNotFound(id),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => StorefrontError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::DuplicateReview {
                user_id,
                product_id,
            } => StorefrontError::DuplicateReview {
                user_id,
                product_id,
            },
            StoreError::ConcurrencyConflict { order_id, .. } => StorefrontError::Conflict(order_id),
            // Another request already turned this cart into an order.
            StoreError::CartNotFound(_) => StorefrontError::Domain(DomainError::CartEmpty),
            StoreError::CartChanged(owner_id) => StorefrontError::CartChanged(owner_id),
            other => StorefrontError::Storage(other),
        }
    }
}

/// Convenience type alias for storefront results.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderStatus;

    #[test]
    fn test_domain_errors_split_into_validation_and_business_rule() {
        let validation = StorefrontError::from(DomainError::MissingField("comment"));
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let rule = StorefrontError::from(DomainError::CancelNotAllowed(OrderStatus::Shipped));
        assert_eq!(rule.kind(), ErrorKind::BusinessRule);

        let empty = StorefrontError::from(DomainError::CartEmpty);
        assert_eq!(empty.kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn test_missing_cart_line_or_product_is_not_found() {
        let err = StorefrontError::from(DomainError::ItemNotFound(ProductId::new()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = StorefrontError::from(DomainError::ProductNotFound(ProductId::new()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_store_errors_are_classified() {
        let product_id = ProductId::new();

        let stock = StorefrontError::from(StoreError::InsufficientStock {
            product_id,
            requested: 6,
            available: 4,
        });
        assert_eq!(stock.kind(), ErrorKind::BusinessRule);
        assert!(stock.is_insufficient_stock());

        let conflict = StorefrontError::from(StoreError::ConcurrencyConflict {
            order_id: OrderId::new(),
            expected: 1,
            actual: 2,
        });
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let storage = StorefrontError::from(StoreError::Unavailable("down".to_string()));
        assert_eq!(storage.kind(), ErrorKind::Storage);

        let missing = StorefrontError::from(StoreError::ProductNotFound(product_id));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let claimed = StorefrontError::from(StoreError::CartNotFound(UserId::new()));
        assert!(matches!(claimed, StorefrontError::Domain(DomainError::CartEmpty)));
        assert_eq!(claimed.kind(), ErrorKind::BusinessRule);

        let edited = StorefrontError::from(StoreError::CartChanged(UserId::new()));
        assert_eq!(edited.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_error_messages() {
        let err = StorefrontError::from(DomainError::CartEmpty);
        assert_eq!(err.to_string(), "Cart is empty");

        let err = StorefrontError::Forbidden("only admins can update order status");
        assert_eq!(err.to_string(), "Forbidden: only admins can update order status");
    }
}
