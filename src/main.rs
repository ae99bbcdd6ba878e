use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_api::{
    api,
    config::{Config, StorageBackend},
    object_store as obj,
    storage::Database,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "portal-api starting");

    // Load configuration
    let config = Config::load()?;
    info!("Loaded configuration for instance: {}", config.node.instance_id);

    // Initialize database
    let db = Database::open(
        &config.node.data_dir,
        &[
            config.collections.officers_table.as_str(),
            config.collections.blogs_table.as_str(),
        ],
    )?;
    info!(
        officers = %config.collections.officers_table,
        blogs = %config.collections.blogs_table,
        "Database opened at: {}",
        config.node.data_dir
    );

    // Initialize object store backend
    let (object_store, url_signer) = match config.storage.backend {
        StorageBackend::Local => {
            let signer = Arc::new(match config.storage.local_signing_secret {
                Some(ref secret) => obj::UrlSigner::from_secret(secret.as_bytes()),
                None => {
                    info!("LOCAL_SIGNING_SECRET not set, signed URLs are valid for this process only");
                    obj::UrlSigner::random()?
                }
            });
            let store = obj::LocalStore::new(
                &config.storage.local_storage_path,
                &config.storage.public_base_url,
                Arc::clone(&signer),
            )?;
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            let store: Arc<dyn obj::ObjectStore> = Arc::new(store);
            (store, Some(signer))
        }
        StorageBackend::Gcs => {
            let store = obj::GcsStore::new(config.storage.gcs_credentials_file.as_deref()).await?;
            info!("Using GCS storage backend");
            let store: Arc<dyn obj::ObjectStore> = Arc::new(store);
            (store, None)
        }
    };

    let bind_address = config.node.bind_address.clone();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(db),
        object_store,
        url_signer,
    ));

    // Build and start the HTTP server
    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
