//! HTTP API server with observability for the storefront.
//!
//! Provides REST endpoints for carts, checkout, order management and reviews,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use domain::PricingPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use storefront::{Storefront, StorefrontStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub storefront: Storefront<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route(
            "/cart",
            get(routes::cart::get::<S>)
                .post(routes::cart::add_item::<S>)
                .delete(routes::cart::clear::<S>),
        )
        .route(
            "/cart/{product_id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route("/orders/admin/all", get(routes::orders::list_all::<S>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update_status::<S>)
                .delete(routes::orders::cancel::<S>),
        )
        .route("/products/{id}", get(routes::products::get::<S>))
        .route(
            "/products/{id}/reviews",
            get(routes::products::list_reviews::<S>).post(routes::products::add_review::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store.
pub fn create_default_state<S: StorefrontStore>(
    store: S,
    policy: PricingPolicy,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        storefront: Storefront::new(store, policy),
    })
}
