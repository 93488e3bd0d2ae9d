use std::sync::Arc;

use folio_api::config::AppConfig;
use folio_api::state::AppState;
use folio_api::{app, audit};
use folio_core::auth::SessionProvider;
use folio_core::events::EventBus;
use folio_core::services::{ServiceContext, Services};
use folio_core::store::{LocalBlobStore, PgRecordStore, Stores, UrlSigner};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting folio API server");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;

    tracing::info!("Database migrations applied");

    let secret = config.jwt_secret.as_bytes();
    let signer = UrlSigner::new(config.public_base_url.clone(), secret);
    let blobs = LocalBlobStore::new(config.storage_dir.clone(), signer);
    blobs
        .ensure_root()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare blob storage: {e}"))?;
    tracing::info!(storage_dir = %config.storage_dir.display(), "Blob storage ready");

    let records = Arc::new(PgRecordStore::new(pool));
    let stores = Stores::new(records.clone(), Arc::new(blobs));
    let sessions = SessionProvider::new(records, secret, config.session_ttl);

    let event_bus = EventBus::new(config.event_bus_capacity);
    let audit_log = audit::spawn_audit_log(&event_bus);

    let context = ServiceContext::new(stores, config.service_config(), event_bus);
    let state = AppState::new(Services::new(context, sessions));
    let router = app(state, config.max_upload_bytes);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    audit_log.abort();
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
