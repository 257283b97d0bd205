use std::sync::Arc;

use db::DBService;
use sqlx::SqlitePool;

pub mod config;
pub mod error;
pub mod file_logging;
pub mod middleware;
pub mod routes;

use config::ServerConfig;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
