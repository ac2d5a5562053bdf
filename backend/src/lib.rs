//! Bengkel Sparepart backend
//!
//! Transactional inventory service for a motorcycle spare-parts workshop:
//! parts, sales, restocks and service jobs with an audited quantity ledger.

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use chrono::FixedOffset;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    /// Local offset for rendering dates and bucketing reports
    pub offset: FixedOffset,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_image_bytes = state.config.media.max_image_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(max_image_bytes))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Bengkel Sparepart API v1"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
