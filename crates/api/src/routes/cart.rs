//! Cart endpoints. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{Cart, CartItem};
use serde::{Deserialize, Serialize};
use storefront::StorefrontStore;

use crate::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::routes::parse_id;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub owner_id: String,
    pub items: Vec<CartItemResponse>,
    pub item_count: usize,
    pub total_price_cents: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            price_cents: item.price.cents(),
            line_total_cents: item.line_total().cents(),
        }
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            owner_id: cart.owner_id().to_string(),
            items: cart.items().iter().map(CartItemResponse::from).collect(),
            item_count: cart.item_count(),
            total_price_cents: cart.total_price().cents(),
            updated_at: cart.updated_at(),
        }
    }
}

// -- Handlers --

/// GET /cart
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .storefront
        .carts
        .get_or_create(requester.user_id)
        .await?;
    Ok(Json(cart.into()))
}

/// POST /cart
#[tracing::instrument(skip(state, payload))]
pub async fn add_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let Json(req) = payload?;
    let cart = state
        .storefront
        .carts
        .add_item(requester.user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// PUT /cart/:product_id
#[tracing::instrument(skip(state, payload))]
pub async fn update_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(product_id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product id")?;
    let Json(req) = payload?;
    let cart = state
        .storefront
        .carts
        .update_item(requester.user_id, product_id, req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/:product_id
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id: ProductId = parse_id(&product_id, "product id")?;
    let cart = state
        .storefront
        .carts
        .remove_item(requester.user_id, product_id)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart
#[tracing::instrument(skip(state))]
pub async fn clear<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.storefront.carts.clear(requester.user_id).await?;
    Ok(Json(cart.into()))
}
