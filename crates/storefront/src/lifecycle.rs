//! Post-purchase order management: reads, admin status updates and
//! cancellation.

use common::{OrderId, Requester};
use domain::{Money, Order, OrderPatch, OrderStatus};
use serde::Serialize;
use store::OrderStore;

use crate::error::{Result, StorefrontError};

/// Raw status update as received from an administrator.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub order_status: Option<String>,
    pub payment_status: Option<String>,
    pub tracking_number: Option<String>,
}

/// Order counts by status plus revenue from orders that were not cancelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub total_revenue: Money,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = Self {
            total_orders: orders.len(),
            ..Self::default()
        };

        for order in orders {
            match order.order_status() {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if order.order_status() != OrderStatus::Cancelled {
                stats.total_revenue += order.total_price();
            }
        }

        stats
    }
}

/// Every order in the system with summary statistics.
#[derive(Debug, Clone)]
pub struct OrderOverview {
    pub orders: Vec<Order>,
    pub stats: OrderStats,
}

/// Order status state machine.
///
/// Writes go through a version check in the store; a concurrent writer that
/// committed first makes this one fail with [`StorefrontError::Conflict`].
#[derive(Clone)]
pub struct OrderLifecycle<S> {
    store: S,
}

impl<S: OrderStore> OrderLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order visible to the requester.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId, requester: &Requester) -> Result<Order> {
        let order = self.load(order_id).await?;
        if !requester.can_access(order.owner_id()) {
            return Err(StorefrontError::Forbidden("not authorized to view this order"));
        }
        Ok(order)
    }

    /// Lists the requester's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, requester: &Requester) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(requester.user_id).await?)
    }

    /// Lists every order with statistics. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, requester: &Requester) -> Result<OrderOverview> {
        if !requester.is_admin() {
            return Err(StorefrontError::Forbidden("only admins can list all orders"));
        }

        let orders = self.store.list_all_orders().await?;
        let stats = OrderStats::from_orders(&orders);
        Ok(OrderOverview { orders, stats })
    }

    /// Applies an admin status update.
    ///
    /// Unknown status values and empty updates are validation errors; a move
    /// the state machine forbids is a business-rule error.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        update: StatusUpdate,
        requester: &Requester,
    ) -> Result<Order> {
        if !requester.is_admin() {
            return Err(StorefrontError::Forbidden("only admins can update order status"));
        }

        let patch = OrderPatch::parse(
            update.order_status.as_deref(),
            update.payment_status.as_deref(),
            update.tracking_number,
        )?;

        let mut order = self.load(order_id).await?;
        let expected_version = order.version();
        let from = order.order_status();

        order.apply_patch(patch)?;
        self.store.update_order(&order, expected_version).await?;

        metrics::counter!("order_status_updates_total").increment(1);
        tracing::info!(%from, to = %order.order_status(), "order status updated");
        Ok(order)
    }

    /// Cancels a pending order on behalf of its owner or an admin.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, requester: &Requester) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        if !requester.can_access(order.owner_id()) {
            return Err(StorefrontError::Forbidden("not authorized to cancel this order"));
        }

        let expected_version = order.version();
        order.cancel()?;
        self.store.update_order(&order, expected_version).await?;

        metrics::counter!("order_cancellations_total").increment(1);
        tracing::info!("order cancelled");
        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(StorefrontError::OrderNotFound(order_id))
    }
}
