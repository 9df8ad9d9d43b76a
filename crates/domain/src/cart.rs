//! Per-user shopping cart.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::Serialize;

use crate::error::DomainError;
use crate::money::Money;
use crate::product::Product;

/// A line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the line was first added.
    pub price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A user's mutable staging area of intended purchases.
///
/// `total_price` is recomputed from the items after every mutation and on
/// rehydration; it is never carried over from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    owner_id: UserId,
    items: Vec<CartItem>,
    total_price: Money,
    updated_at: DateTime<Utc>,
}

// Query methods
impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            items: Vec::new(),
            total_price: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuilds a cart from stored lines.
    pub fn from_parts(owner_id: UserId, items: Vec<CartItem>, updated_at: DateTime<Utc>) -> Self {
        let mut cart = Self {
            owner_id,
            items,
            total_price: Money::zero(),
            updated_at,
        };
        cart.recompute_total();
        cart
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// Mutations
impl Cart {
    /// Adds `quantity` of `product`, merging with an existing line.
    ///
    /// The combined quantity is validated against the product's live stock.
    /// A new line snapshots the product's current price; an existing line
    /// keeps the price it was added at.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity {
                quantity,
                minimum: 1,
            });
        }

        let existing = self.get_item(product.id).map_or(0, |item| item.quantity);
        product.ensure_stock(existing.saturating_add(quantity))?;

        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product_id: product.id,
                quantity,
                price: product.price,
            }),
        }

        self.touch();
        Ok(())
    }

    /// Sets the quantity of an existing line; zero removes it.
    ///
    /// `product` is the live catalog entry. It may be absent for a removal;
    /// any other quantity needs it and fails with `ProductNotFound` without.
    pub fn update_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        product: Option<&Product>,
    ) -> Result<(), DomainError> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(DomainError::ItemNotFound(product_id))?;

        if quantity == 0 {
            self.items.remove(index);
        } else {
            product
                .ok_or(DomainError::ProductNotFound(product_id))?
                .ensure_stock(quantity)?;
            self.items[index].quantity = quantity;
        }

        self.touch();
        Ok(())
    }

    /// Removes a line if present.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.product_id != product_id);
        self.touch();
    }

    /// Removes all lines.
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.recompute_total();
        self.updated_at = Utc::now();
    }

    fn recompute_total(&mut self) {
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_cents: i64, stock: u32) -> Product {
        Product::new("Widget", "WG-001", Money::from_cents(price_cents), stock)
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = Cart::new(UserId::new());
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());
    }

    #[test]
    fn test_add_item_snapshots_price() {
        let mut cart = Cart::new(UserId::new());
        let mut widget = product(1000, 10);

        cart.add_item(&widget, 2).unwrap();
        widget.price = Money::from_cents(5000);

        let item = cart.get_item(widget.id).unwrap();
        assert_eq!(item.price.cents(), 1000);
        assert_eq!(cart.total_price().cents(), 2000);
    }

    #[test]
    fn test_add_same_item_merges_lines() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(1000, 10);

        cart.add_item(&widget, 2).unwrap();
        cart.add_item(&widget, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.get_item(widget.id).unwrap().quantity, 5);
        assert_eq!(cart.total_price().cents(), 5000);
    }

    #[test]
    fn test_add_item_checks_combined_quantity() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(1000, 5);

        cart.add_item(&widget, 3).unwrap();
        let result = cart.add_item(&widget, 3);

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            })
        ));
        assert_eq!(cart.get_item(widget.id).unwrap().quantity, 3);
    }

    #[test]
    fn test_add_zero_quantity_fails() {
        let mut cart = Cart::new(UserId::new());
        let result = cart.add_item(&product(1000, 5), 0);
        assert!(matches!(result, Err(DomainError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_update_item_quantity() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(250, 10);
        cart.add_item(&widget, 1).unwrap();

        cart.update_item(widget.id, 4, Some(&widget)).unwrap();

        assert_eq!(cart.get_item(widget.id).unwrap().quantity, 4);
        assert_eq!(cart.total_price().cents(), 1000);
    }

    #[test]
    fn test_update_item_to_zero_removes_line() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(250, 10);
        cart.add_item(&widget, 1).unwrap();

        cart.update_item(widget.id, 0, None).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());
    }

    #[test]
    fn test_update_item_over_stock_fails() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(250, 3);
        cart.add_item(&widget, 1).unwrap();

        let result = cart.update_item(widget.id, 4, Some(&widget));
        assert!(matches!(result, Err(DomainError::InsufficientStock { .. })));
        assert_eq!(cart.get_item(widget.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_line_without_catalog_entry() {
        let mut cart = Cart::new(UserId::new());
        let widget = product(250, 10);
        cart.add_item(&widget, 1).unwrap();

        let result = cart.update_item(widget.id, 2, None);
        assert_eq!(result, Err(DomainError::ProductNotFound(widget.id)));
        assert_eq!(cart.get_item(widget.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_missing_item_fails() {
        let mut cart = Cart::new(UserId::new());
        let result = cart.update_item(ProductId::new(), 1, None);
        assert!(matches!(result, Err(DomainError::ItemNotFound(_))));
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = Cart::new(UserId::new());
        let a = product(1999, 10);
        let b = product(501, 10);

        cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 3).unwrap();
        cart.update_item(a.id, 1, Some(&a)).unwrap();
        cart.remove_item(b.id);
        cart.add_item(&b, 1).unwrap();

        let expected: i64 = cart
            .items()
            .iter()
            .map(|item| item.price.cents() * i64::from(item.quantity))
            .sum();
        assert_eq!(cart.total_price().cents(), expected);
        assert_eq!(cart.total_price().cents(), 2500);

        cart.clear();
        assert_eq!(cart.total_price(), Money::zero());
    }

    #[test]
    fn test_from_parts_recomputes_total() {
        let owner = UserId::new();
        let items = vec![CartItem {
            product_id: ProductId::new(),
            quantity: 3,
            price: Money::from_cents(5000),
        }];
        let cart = Cart::from_parts(owner, items, Utc::now());
        assert_eq!(cart.total_price().cents(), 15000);
        assert_eq!(cart.total_quantity(), 3);
    }
}
