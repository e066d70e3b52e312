//! Tala API Server
//!
//! Main entry point for the Tala back office service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tala_api::{AppState, create_router};
use tala_core::storage::{ReceiptStore, ReceiptStoreConfig, StorageProvider};
use tala_db::connect;
use tala_shared::{AppConfig, JwtConfig, JwtService, config::StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tala=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: config.jwt.access_token_minutes,
        refresh_token_expires_days: config.jwt.refresh_token_days,
    });

    // Receipt storage is optional; uploads are disabled without it.
    let storage = match &config.storage {
        Some(settings) => match build_receipt_store(settings) {
            Ok(store) => {
                info!(provider = store.provider_name(), "Receipt storage configured");
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!(error = %e, "Receipt storage misconfigured; uploads disabled");
                None
            }
        },
        None => {
            warn!("No receipt storage configured; uploads disabled");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Map the config section onto a receipt store.
fn build_receipt_store(
    settings: &StorageSettings,
) -> Result<ReceiptStore, tala_core::storage::StorageError> {
    let provider = match settings.provider.as_str() {
        "s3" => StorageProvider::s3(
            &settings.endpoint,
            &settings.bucket,
            &settings.access_key,
            &settings.secret_key,
            &settings.region,
        ),
        "azblob" => StorageProvider::azure_blob(
            &settings.access_key,
            &settings.secret_key,
            &settings.bucket,
        ),
        _ => StorageProvider::local_fs(&settings.root),
    };

    ReceiptStore::from_config(ReceiptStoreConfig::new(provider))
}
