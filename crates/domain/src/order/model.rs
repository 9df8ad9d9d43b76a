//! Placed order record.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::pricing::{PriceBreakdown, PricingPolicy};

use super::{OrderItem, OrderPatch, OrderStatus, PaymentStatus, ShippingAddress};

/// Payment method recorded when the caller does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "mock";

/// A committed purchase.
///
/// Items and pricing are fixed at construction. Only the status fields,
/// the tracking number, `updated_at` and `version` change afterwards, and
/// only through [`Order::apply_patch`] and [`Order::cancel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    owner_id: UserId,
    items: Vec<OrderItem>,
    shipping_address: ShippingAddress,
    payment_method: String,
    subtotal: Money,
    shipping_cost: Money,
    tax: Money,
    total_price: Money,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Incremented on every mutation; stores compare-and-set on it.
    version: u64,
}

impl Order {
    /// Prices `items` under `policy` and builds a pending order with payment
    /// already completed.
    pub fn place(
        owner_id: UserId,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: Option<String>,
        policy: &PricingPolicy,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::CartEmpty);
        }
        shipping_address.validate()?;

        let PriceBreakdown {
            subtotal,
            shipping_cost,
            tax,
            total,
        } = policy.quote(&items);

        let payment_method = payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            owner_id,
            items,
            shipping_address,
            payment_method,
            subtotal,
            shipping_cost,
            tax,
            total_price: total,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Completed,
            tracking_number: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn order_status(&self) -> OrderStatus {
        self.order_status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// Status mutations
impl Order {
    /// Applies an administrative patch.
    ///
    /// A status change must follow the transition graph; the other fields
    /// are overwritten when supplied.
    pub fn apply_patch(&mut self, patch: OrderPatch) -> Result<(), DomainError> {
        if let Some(next) = patch.order_status {
            if !self.order_status.can_transition_to(next) {
                return Err(DomainError::InvalidStatusTransition {
                    from: self.order_status,
                    to: next,
                });
            }
            self.order_status = next;
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
        if let Some(tracking_number) = patch.tracking_number {
            self.tracking_number = Some(tracking_number);
        }
        self.touch();
        Ok(())
    }

    /// Cancels a pending order.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.order_status.can_cancel() {
            return Err(DomainError::CancelNotAllowed(self.order_status));
        }
        self.order_status = OrderStatus::Cancelled;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Grace Hopper".to_string(),
            street: "1 Compiler Rd".to_string(),
            city: "Arlington".to_string(),
            state: Some("VA".to_string()),
            postal_code: "22201".to_string(),
            country: "US".to_string(),
            phone: None,
        }
    }

    fn place(price_cents: i64, quantity: u32) -> Order {
        let items = vec![OrderItem::new(
            ProductId::new(),
            "Widget",
            quantity,
            Money::from_cents(price_cents),
        )];
        Order::place(UserId::new(), items, address(), None, &PricingPolicy::default()).unwrap()
    }

    #[test]
    fn test_place_order_prices_items() {
        let order = place(5000, 3);

        assert_eq!(order.subtotal().cents(), 15000);
        assert_eq!(order.shipping_cost(), Money::zero());
        assert_eq!(order.tax().cents(), 1500);
        assert_eq!(order.total_price().cents(), 16500);
        assert_eq!(order.order_status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Completed);
        assert_eq!(order.payment_method(), DEFAULT_PAYMENT_METHOD);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn test_place_empty_order_fails() {
        let result = Order::place(
            UserId::new(),
            vec![],
            address(),
            None,
            &PricingPolicy::default(),
        );
        assert_eq!(result, Err(DomainError::CartEmpty));
    }

    #[test]
    fn test_place_with_incomplete_address_fails() {
        let mut addr = address();
        addr.city = String::new();
        let items = vec![OrderItem::new(ProductId::new(), "Widget", 1, Money::from_cents(100))];
        let result = Order::place(UserId::new(), items, addr, None, &PricingPolicy::default());
        assert_eq!(result, Err(DomainError::MissingField("shipping_address.city")));
    }

    #[test]
    fn test_cancel_pending_order() {
        let mut order = place(1000, 1);
        order.cancel().unwrap();
        assert_eq!(order.order_status(), OrderStatus::Cancelled);
        assert_eq!(order.version(), 2);
    }

    #[test]
    fn test_cannot_cancel_shipped_order() {
        let mut order = place(1000, 1);
        order
            .apply_patch(OrderPatch {
                order_status: Some(OrderStatus::Shipped),
                ..OrderPatch::default()
            })
            .unwrap();

        let result = order.cancel();

        assert_eq!(result, Err(DomainError::CancelNotAllowed(OrderStatus::Shipped)));
        assert_eq!(order.order_status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_patch_rejects_backward_transition() {
        let mut order = place(1000, 1);
        order
            .apply_patch(OrderPatch {
                order_status: Some(OrderStatus::Delivered),
                ..OrderPatch::default()
            })
            .unwrap();
        let version = order.version();

        let result = order.apply_patch(OrderPatch {
            order_status: Some(OrderStatus::Processing),
            tracking_number: Some("TRACK-1".to_string()),
            ..OrderPatch::default()
        });

        assert!(matches!(
            result,
            Err(DomainError::InvalidStatusTransition { .. })
        ));
        assert_eq!(order.tracking_number(), None);
        assert_eq!(order.version(), version);
    }

    #[test]
    fn test_patch_sets_tracking_and_payment() {
        let mut order = place(1000, 1);
        let total = order.total_price();
        order
            .apply_patch(OrderPatch {
                order_status: Some(OrderStatus::Shipped),
                payment_status: Some(PaymentStatus::Completed),
                tracking_number: Some("1Z999AA10123456784".to_string()),
            })
            .unwrap();

        assert_eq!(order.order_status(), OrderStatus::Shipped);
        assert_eq!(order.tracking_number(), Some("1Z999AA10123456784"));
        assert_eq!(order.total_price(), total);
    }

    #[test]
    fn test_serialization_roundtrip_keeps_pricing() {
        let order = place(5000, 2);
        let json = serde_json::to_string(&order).unwrap();
        let restored: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, order);
    }
}
