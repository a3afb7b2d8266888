//! Kaderisasi - Membership and Community Backend
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kaderisasi::identity::{Argon2Hasher, HmacTokenIssuer, LogMailer};
use kaderisasi::storage::config::load_config;
use kaderisasi::storage::{Database, FsObjectStore};
use kaderisasi::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kaderisasi v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;

    let db_path = config.database_path();
    let db = Arc::new(
        Database::open(&db_path)
            .with_context(|| format!("opening database at {}", db_path.display()))?,
    );
    let objects = Arc::new(
        FsObjectStore::new(config.storage_root()).context("preparing object storage")?,
    );

    let state = AppState::new(
        db,
        objects,
        Arc::new(Argon2Hasher::new()),
        Arc::new(HmacTokenIssuer::new(config.auth.secret())),
        Arc::new(LogMailer::new(config.mail.from_address.clone())),
        &config.auth,
    );
    let app = router(state, &config.server);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
