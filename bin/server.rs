// Club Portal - Web Server
// REST API with Axum

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use club_portal::api::{router, AppState};
use club_portal::{open_database, AdminToken, Config, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = Config::load()?;

    let conn = open_database(&config.db_path)?;
    info!(
        policy = config.past_policy.name(),
        admin = config.admin_token.is_some(),
        "Past-instant validation configured"
    );

    // Create shared state
    let state = AppState::new(
        conn,
        config.validator(),
        Arc::new(SystemClock),
        AdminToken::new(config.admin_token.as_deref()),
    );

    let app = router(state);

    let listener = TcpListener::bind(config.address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.address))?;
    info!("Server running on http://{}", config.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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
}
