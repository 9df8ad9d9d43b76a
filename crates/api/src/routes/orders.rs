//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Order, OrderItem, ShippingAddress};
use serde::{Deserialize, Serialize};
use storefront::{CheckoutRequest, OrderStats, StatusUpdate, StorefrontStore};

use crate::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::routes::parse_id;

// -- Request types --

/// Address fields are all optional on the wire so that a missing field is
/// reported by name instead of as a JSON shape error.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ShippingAddressRequest {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(req: ShippingAddressRequest) -> Self {
        Self {
            name: req.name,
            street: req.street,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
            phone: req.phone,
        }
    }
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub shipping_address: ShippingAddressRequest,
    pub payment_method: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateStatusRequest {
    pub order_status: Option<String>,
    pub payment_status: Option<String>,
    pub tracking_number: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner_id: String,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub subtotal_cents: i64,
    pub shipping_cost_cents: i64,
    pub tax_cents: i64,
    pub total_price_cents: i64,
    pub order_status: String,
    pub payment_status: String,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            price_cents: item.price.cents(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            owner_id: order.owner_id().to_string(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            shipping_address: order.shipping_address().clone(),
            payment_method: order.payment_method().to_string(),
            subtotal_cents: order.subtotal().cents(),
            shipping_cost_cents: order.shipping_cost().cents(),
            tax_cents: order.tax().cents(),
            total_price_cents: order.total_price().cents(),
            order_status: order.order_status().to_string(),
            payment_status: order.payment_status().to_string(),
            tracking_number: order.tracking_number().map(String::from),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderStatsResponse {
    pub total_orders: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub total_revenue_cents: i64,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(stats: OrderStats) -> Self {
        Self {
            total_orders: stats.total_orders,
            pending: stats.pending,
            processing: stats.processing,
            shipped: stats.shipped,
            delivered: stats.delivered,
            cancelled: stats.cancelled,
            total_revenue_cents: stats.total_revenue.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct AllOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub stats: OrderStatsResponse,
}

// -- Handlers --

/// POST /orders: place an order from the caller's cart.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(req) = payload?;
    let request = CheckoutRequest {
        shipping_address: req.shipping_address.into(),
        payment_method: req.payment_method,
    };

    let order = state
        .storefront
        .checkout
        .place_order(requester.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.storefront.orders.list_for_user(&requester).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/admin/all: every order with statistics.
#[tracing::instrument(skip(state))]
pub async fn list_all<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
) -> Result<Json<AllOrdersResponse>, ApiError> {
    let overview = state.storefront.orders.list_all(&requester).await?;
    Ok(Json(AllOrdersResponse {
        orders: overview.orders.iter().map(OrderResponse::from).collect(),
        stats: overview.stats.into(),
    }))
}

/// GET /orders/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order id")?;
    let order = state.storefront.orders.get(order_id, &requester).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/:id: admin status update.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order id")?;
    let Json(req) = payload?;
    let update = StatusUpdate {
        order_status: req.order_status,
        payment_status: req.payment_status,
        tracking_number: req.tracking_number,
    };

    let order = state
        .storefront
        .orders
        .update_status(order_id, update, &requester)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// DELETE /orders/:id: cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id, "order id")?;
    let order = state.storefront.orders.cancel(order_id, &requester).await?;
    Ok(Json(OrderResponse::from(&order)))
}
