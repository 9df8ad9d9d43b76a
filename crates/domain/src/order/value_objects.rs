//! Value objects frozen into an order.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// A purchased line, copied from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Product name at the time of purchase.
    pub name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Unit price snapshot from the cart.
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: ProductId, name: impl Into<String>, quantity: u32, price: Money) -> Self {
        Self {
            product_id,
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Returns the total price for this item (quantity * price).
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// Delivery address supplied at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Checks that every required field is present and not blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("shipping_address.name", &self.name),
            ("shipping_address.street", &self.street),
            ("shipping_address.city", &self.city),
            ("shipping_address.postal_code", &self.postal_code),
            ("shipping_address.country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::MissingField(field));
            }
        }
        Ok(())
    }
}
