//! Domain error types.

use common::ProductId;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by domain rules.
///
/// Validation failures (malformed input) and business-rule failures (valid
/// input that the current state forbids) are kept apart so callers can report
/// them differently; see [`DomainError::is_validation`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Quantity below the allowed minimum.
    #[error("Invalid quantity: {quantity} (must be at least {minimum})")]
    InvalidQuantity { quantity: u32, minimum: u32 },

    /// A required input field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Unknown order status value.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// Unknown payment status value.
    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    /// A status patch carried no fields.
    #[error("Nothing to update")]
    EmptyPatch,

    /// Rating outside 1..=5.
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The product behind a cart line is no longer in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product is not in the cart.
    #[error("Item not in cart: {0}")]
    ItemNotFound(ProductId),

    /// Checkout attempted with no items.
    #[error("Cart is empty")]
    CartEmpty,

    /// Status change not allowed by the order state machine.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation attempted outside the pending state.
    #[error("Can only cancel pending orders (order is {0})")]
    CancelNotAllowed(OrderStatus),
}

impl DomainError {
    /// Returns true for malformed or missing input, false for business-rule
    /// rejections and lookups.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidQuantity { .. }
                | DomainError::MissingField(_)
                | DomainError::InvalidStatus(_)
                | DomainError::InvalidPaymentStatus(_)
                | DomainError::EmptyPatch
                | DomainError::InvalidRating(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(DomainError::MissingField("city").is_validation());
        assert!(DomainError::InvalidRating(7).is_validation());
        assert!(!DomainError::CartEmpty.is_validation());
        assert!(!DomainError::ProductNotFound(ProductId::new()).is_validation());
        assert!(!DomainError::CancelNotAllowed(OrderStatus::Shipped).is_validation());
    }

    #[test]
    fn messages() {
        assert_eq!(
            DomainError::MissingField("shippingAddress.city").to_string(),
            "shippingAddress.city is required"
        );
        assert_eq!(
            DomainError::CancelNotAllowed(OrderStatus::Shipped).to_string(),
            "Can only cancel pending orders (order is shipped)"
        );
    }
}
