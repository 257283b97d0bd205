use db::DBService;
use server::{AppState, config::ServerConfig, file_logging, routes};
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();
    // Held until exit so buffered file logs are flushed.
    let _file_log_guard = file_logging::init_logging(&config.log_level);

    let db = DBService::new().await?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let actual_port = listener.local_addr()?.port();
    if config.admin_token.is_none() {
        tracing::warn!("PORTFOLIO_ADMIN_TOKEN is not set; admin routes are open");
    }
    tracing::info!("Server running on http://{}:{actual_port}", config.host);

    let app_router = routes::router(AppState::new(db.clone(), config));
    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    perform_cleanup_actions(&db).await;
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}

/// Flush the WAL into the main file and close the pool.
pub async fn perform_cleanup_actions(db: &DBService) {
    tracing::info!("Running final WAL checkpoint...");
    match db.checkpoint().await {
        Ok(()) => tracing::info!("Final WAL checkpoint completed"),
        Err(e) => tracing::warn!("Final WAL checkpoint failed (data may still be in WAL): {}", e),
    }

    db.pool.close().await;
    tracing::info!("Database connection pool closed");
}
