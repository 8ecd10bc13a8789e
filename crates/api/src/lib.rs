//! HTTP API server for the bookstore backend.
//!
//! Provides REST endpoints for the order workflow, catalog browsing, and
//! account management, with JWT bearer authentication, structured logging
//! (tracing), and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use engine::OrderEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::AuthKeys;
use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub engine: OrderEngine,
    pub pool: PgPool,
    pub auth: AuthKeys,
}

impl AppState {
    /// Builds state from a connected pool and the server configuration.
    pub fn new(pool: PgPool, config: &Config) -> Arc<Self> {
        Arc::new(AppState {
            engine: OrderEngine::new(pool.clone()),
            pool,
            auth: AuthKeys::new(&config.jwt_secret, config.token_ttl_minutes),
        })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/users/me", get(routes::users::me))
        .route("/users/me", put(routes::users::update_me))
        .route("/products", get(routes::products::list))
        .route("/products/categories", get(routes::products::list_categories))
        .route("/products/categories/{id}", get(routes::products::get_category))
        .route("/products/authors", get(routes::products::list_authors))
        .route("/products/authors/{id}", get(routes::products::get_author))
        .route("/products/publishers", get(routes::products::list_publishers))
        .route("/products/publishers/{id}", get(routes::products::get_publisher))
        .route("/products/{id}", get(routes::products::get))
        .route("/orders", post(routes::orders::create))
        .route("/orders/me", get(routes::orders::list_mine))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", put(routes::orders::cancel))
        .route("/orders/{id}/items", put(routes::orders::update_items))
        .route("/admin/orders/{id}", put(routes::admin::update_order_status))
        .route("/admin/products", post(routes::admin::create_product))
        .route("/admin/products/{id}", put(routes::admin::update_product))
        .route("/admin/stats/revenue", get(routes::admin::revenue_stats))
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
