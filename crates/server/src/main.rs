// SpiceScape API server
// Decision: DATABASE_URL is optional; without it the server runs on the in-memory store
// Decision: Reconcile runs only when RECONCILE_ON_STARTUP is set

use anyhow::{Context, Result};
use spicescape_server::app::{build_router, ServerConfig};
use spicescape_server::auth::AuthConfig;
use spicescape_server::images::image_host_from_env;
use spicescape_server::storage::StorageBackend;
use spicescape_server::telemetry::{init_tracing, TelemetryConfig};
use spicescape_server::GraphCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine, the environment may already be set
    let _ = dotenvy::dotenv();

    init_tracing(&TelemetryConfig::from_env());

    tracing::info!("spicescape-server starting...");

    let db = match std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) {
        Some(url) => {
            let db = StorageBackend::postgres(&url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on exit)");
            StorageBackend::in_memory()
        }
    };

    let images = image_host_from_env();
    let auth_config = AuthConfig::from_env();
    tracing::info!(
        access_ttl_secs = auth_config.jwt.access_token_lifetime.as_secs(),
        refresh_ttl_secs = auth_config.jwt.refresh_token_lifetime.as_secs(),
        cookie_secure = auth_config.cookie.secure,
        "Authentication configured"
    );

    let config = ServerConfig::from_env();
    if config.cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS origins configured");
    }

    if config.reconcile_on_startup {
        let report = GraphCoordinator::new(db.clone())
            .reconcile()
            .await
            .context("Reconcile failed")?;
        tracing::info!(?report, "Graph reconcile finished");
    }

    let app = build_router(db, images, auth_config, &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!(prefix = %config.api_prefix, "HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
