//! Product lookup and review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{Product, Review};
use serde::{Deserialize, Serialize};
use storefront::StorefrontStore;

use crate::AppState;
use crate::auth::Identity;
use crate::error::ApiError;
use crate::routes::parse_id;

#[derive(Deserialize)]
pub struct AddReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub stock: u32,
    pub is_active: bool,
    pub rating: f64,
    pub review_count: u32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            sku: product.sku,
            price_cents: product.price.cents(),
            original_price_cents: product.original_price.map(|p| p.cents()),
            stock: product.stock,
            is_active: product.is_active,
            rating: product.rating,
            review_count: product.review_count,
        }
    }
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.to_string(),
            user_id: review.user_id.to_string(),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ReviewAddedResponse {
    pub review: ReviewResponse,
    pub rating: f64,
    pub review_count: u32,
}

/// GET /products/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_id(&id, "product id")?;
    let product = state.storefront.catalog.get_product(product_id).await?;
    Ok(Json(product.into()))
}

/// GET /products/:id/reviews
#[tracing::instrument(skip(state))]
pub async fn list_reviews<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let product_id: ProductId = parse_id(&id, "product id")?;
    let reviews = state.storefront.reviews.list_reviews(product_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// POST /products/:id/reviews
#[tracing::instrument(skip(state, payload))]
pub async fn add_review<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    Identity(requester): Identity,
    Path(id): Path<String>,
    payload: Result<Json<AddReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewAddedResponse>), ApiError> {
    let product_id: ProductId = parse_id(&id, "product id")?;
    let Json(req) = payload?;

    let outcome = state
        .storefront
        .reviews
        .add_review(requester.user_id, product_id, req.rating, req.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewAddedResponse {
            review: outcome.review.into(),
            rating: outcome.summary.rating,
            review_count: outcome.summary.review_count,
        }),
    ))
}
