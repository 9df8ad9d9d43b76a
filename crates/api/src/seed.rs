//! Demo catalog loaded when running without a database.

use domain::{Money, Product};

/// (name, sku, price cents, original price cents, stock)
const DEMO_CATALOG: &[(&str, &str, i64, Option<i64>, u32)] = &[
    ("Wireless Headphones", "WH-001", 7999, Some(9999), 50),
    ("Smart Watch", "SW-001", 19999, Some(24999), 30),
    ("USB-C Cable", "UC-001", 1299, None, 100),
    ("Men's T-Shirt", "TS-001", 2499, Some(3499), 75),
    ("Running Shoes", "RS-001", 8999, Some(12999), 45),
    ("Denim Jeans", "DJ-001", 5499, Some(7999), 60),
    ("Decorative Pillow", "DP-001", 2999, None, 40),
    ("Table Lamp", "TL-001", 4499, Some(5999), 35),
    ("Coffee Maker", "CM-001", 6999, Some(8999), 25),
    ("JavaScript Guide", "BK-001", 3499, Some(4999), 55),
    ("React Mastery", "BK-002", 3999, Some(5499), 40),
    ("Web Design Principles", "BK-003", 2999, None, 50),
];

/// Builds the demo products with fresh ids.
pub fn demo_products() -> Vec<Product> {
    DEMO_CATALOG
        .iter()
        .map(|&(name, sku, price, original_price, stock)| {
            let product = Product::new(name, sku, Money::from_cents(price), stock);
            match original_price {
                Some(cents) => product.with_original_price(Money::from_cents(cents)),
                None => product,
            }
        })
        .collect()
}
