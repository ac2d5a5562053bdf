//! Bengkel Sparepart - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use bengkel_backend::{create_app, AppState, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bengkel_server=debug,bengkel_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("loading configuration")?;
    let offset = config.utc_offset().context("validating locale.utc_offset_hours")?;

    tracing::info!("Starting Bengkel Sparepart Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Local offset: {}", offset);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .context("parsing server.host")?;
    let addr = SocketAddr::from((host, config.server.port));

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
        offset,
    };

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
