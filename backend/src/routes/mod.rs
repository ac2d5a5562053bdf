//! Route definitions for the Bengkel Sparepart API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Multipart framing allowance on top of the image itself
const MULTIPART_OVERHEAD: usize = 16 * 1024;

/// Create API routes
pub fn api_routes(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes())
        // Spare parts; `find` is public
        .nest("/sparepart", part_routes(max_image_bytes))
        // Transactions
        .nest("/sales", sales_routes())
        .nest("/restock", restock_routes())
        .nest("/service", service_routes())
        // Reference catalog
        .nest("/catalog", catalog_routes())
        // Owner views
        .route("/report/:family", get(handlers::monthly_report))
        .route("/log", get(handlers::list_audit_log))
        // Profiles
        .route(
            "/profile/:user_id",
            get(handlers::get_profile).put(handlers::update_profile),
        )
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
}

/// Spare part routes
fn part_routes(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_parts).post(handlers::create_part))
        .route("/find", get(handlers::find_parts))
        .route(
            "/:part_id",
            get(handlers::get_part)
                .put(handlers::update_part)
                .delete(handlers::delete_part),
        )
        .route(
            "/:part_id/image",
            put(handlers::upload_part_image)
                .layer(DefaultBodyLimit::max(max_image_bytes + MULTIPART_OVERHEAD)),
        )
}

/// Sales routes
fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sales))
        .route(
            "/:sales_id",
            get(handlers::get_sales)
                .put(handlers::replace_sales)
                .delete(handlers::delete_sales),
        )
}

/// Restock routes
fn restock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_restocks).post(handlers::create_restock))
        .route(
            "/:restock_id",
            get(handlers::get_restock)
                .put(handlers::replace_restock)
                .delete(handlers::delete_restock),
        )
}

/// Service job routes
fn service_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_service_jobs).post(handlers::create_service_job),
        )
        .route(
            "/:service_id",
            get(handlers::get_service_job)
                .put(handlers::replace_service_job)
                .delete(handlers::delete_service_job),
        )
}

/// Catalog routes, one set for every kind
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:kind",
            get(handlers::list_catalog).post(handlers::create_catalog_entry),
        )
        .route(
            "/:kind/:id",
            get(handlers::get_catalog_entry)
                .put(handlers::update_catalog_entry)
                .delete(handlers::delete_catalog_entry),
        )
}
