//! Agrichain API Server
//!
//! Main entry point for the account registry service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrichain_api::{AppState, create_router};
use agrichain_core::storage::{PhotoStore, StorageConfig, StorageProvider};
use agrichain_db::connect;
use agrichain_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrichain=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a missing JWT secret stops startup here
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Profile photo directory
    tokio::fs::create_dir_all(&config.storage.profile_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create profile directory {}",
                config.storage.profile_dir.display()
            )
        })?;
    let storage_config = StorageConfig::new(StorageProvider::local_fs(
        config.storage.profile_dir.clone(),
    ))
    .with_max_file_size(config.storage.max_file_size);
    let photos = PhotoStore::from_config(storage_config).context("Failed to open photo store")?;
    photos
        .ensure_default_photo()
        .await
        .context("Failed to install default profile photo")?;
    info!(
        root = %config.storage.profile_dir.display(),
        max_file_size = config.storage.max_file_size,
        "Photo store configured"
    );

    // Create JWT service
    let jwt_service = JwtService::new(&config.jwt);

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        photos: Arc::new(photos),
    };

    // Create router
    let app = create_router(state, &config.cors);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
