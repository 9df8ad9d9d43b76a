//! Catalog product as seen by the cart and checkout.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::review::RatingSummary;

/// A catalog product.
///
/// The catalog itself is managed elsewhere; the storefront core only reads
/// price and stock, decrements stock at checkout and refreshes the rating
/// when reviews arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub stock: u32,
    pub is_active: bool,
    pub rating: f64,
    pub review_count: u32,
}

impl Product {
    /// Creates an active product with no reviews.
    pub fn new(name: impl Into<String>, sku: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            sku: sku.into(),
            price,
            original_price: None,
            stock,
            is_active: true,
            rating: 0.0,
            review_count: 0,
        }
    }

    /// Sets the pre-discount price.
    pub fn with_original_price(mut self, original_price: Money) -> Self {
        self.original_price = Some(original_price);
        self
    }

    /// Fails with `InsufficientStock` if `quantity` exceeds current stock.
    pub fn ensure_stock(&self, quantity: u32) -> Result<(), DomainError> {
        if quantity > self.stock {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.stock,
            });
        }
        Ok(())
    }

    /// Copies an aggregate rating onto the product.
    pub fn apply_rating(&mut self, summary: RatingSummary) {
        self.rating = summary.rating;
        self.review_count = summary.review_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_stock_allows_exact_amount() {
        let product = Product::new("USB-C Cable", "UC-001", Money::from_cents(1299), 3);
        assert!(product.ensure_stock(3).is_ok());
        assert!(matches!(
            product.ensure_stock(4),
            Err(DomainError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }
}
