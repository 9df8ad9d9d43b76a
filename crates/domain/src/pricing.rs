//! Checkout pricing: subtotal, shipping and tax.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::OrderItem;

/// Tunable pricing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Shipping is free when the subtotal is strictly above this amount.
    pub free_shipping_threshold: Money,
    /// Shipping charged at or below the threshold.
    pub flat_shipping_cost: Money,
    /// Tax rate in basis points (1000 = 10%).
    pub tax_rate_bps: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_dollars(100),
            flat_shipping_cost: Money::from_dollars(10),
            tax_rate_bps: 1000,
        }
    }
}

/// Priced totals for a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    /// Prices a list of order items using their snapshot prices.
    pub fn quote(&self, items: &[OrderItem]) -> PriceBreakdown {
        let subtotal = items.iter().map(OrderItem::line_total).sum();
        self.quote_subtotal(subtotal)
    }

    /// Derives shipping, tax and total from a subtotal.
    ///
    /// Tax is charged on the subtotal only, not on shipping.
    pub fn quote_subtotal(&self, subtotal: Money) -> PriceBreakdown {
        let shipping_cost = if subtotal > self.free_shipping_threshold {
            Money::zero()
        } else {
            self.flat_shipping_cost
        };
        let tax = subtotal.apply_rate_bps(self.tax_rate_bps);

        PriceBreakdown {
            subtotal,
            shipping_cost,
            tax,
            total: subtotal + shipping_cost + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    #[test]
    fn test_shipping_charged_at_threshold() {
        let quote = PricingPolicy::default().quote_subtotal(Money::from_cents(10000));
        assert_eq!(quote.shipping_cost.cents(), 1000);
        assert_eq!(quote.tax.cents(), 1000);
        assert_eq!(quote.total.cents(), 12000);
    }

    #[test]
    fn test_shipping_free_above_threshold() {
        let quote = PricingPolicy::default().quote_subtotal(Money::from_cents(10001));
        assert_eq!(quote.shipping_cost, Money::zero());
    }

    #[test]
    fn test_quote_items() {
        let items = vec![OrderItem::new(
            ProductId::new(),
            "Widget",
            3,
            Money::from_cents(5000),
        )];
        let quote = PricingPolicy::default().quote(&items);

        assert_eq!(quote.subtotal.cents(), 15000);
        assert_eq!(quote.shipping_cost.cents(), 0);
        assert_eq!(quote.tax.cents(), 1500);
        assert_eq!(quote.total.cents(), 16500);
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let quote = PricingPolicy::default().quote_subtotal(Money::from_cents(1299));
        assert_eq!(quote.tax.cents(), 130);
        assert_eq!(quote.total.cents(), 1299 + 1000 + 130);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            free_shipping_threshold: Money::from_dollars(50),
            flat_shipping_cost: Money::from_cents(499),
            tax_rate_bps: 825,
        };
        let quote = policy.quote_subtotal(Money::from_dollars(40));
        assert_eq!(quote.shipping_cost.cents(), 499);
        assert_eq!(quote.tax.cents(), 330);
    }
}
