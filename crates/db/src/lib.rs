use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    Error, Executor, Pool, Sqlite,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use tracing::info;
use utils::assets::database_path;

pub mod models;
pub mod ordering;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ordering::{
    Collection, CollectionKind, Direction, Member, Membership, MoveOutcome, OrderingError,
    PositionChange, reader_order,
};

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// SQLite has a single writer, so the pool stays small.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const DEFAULT_MIN_CONNECTIONS: u32 = 2;

const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// 10 minutes.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Read `PORTFOLIO_SQLITE_MAX_CONNECTIONS`, accepting 1..=100.
fn max_connections_from_env() -> u32 {
    std::env::var("PORTFOLIO_SQLITE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Per-connection pragmas, applied via `after_connect`.
///
/// `synchronous` is set again after `mmap_size`; with mmap enabled SQLite can
/// otherwise skip fsync on writes and surface SQLITE_IOERR under load.
async fn apply_performance_pragmas(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.execute("PRAGMA temp_store = 2").await?;

    #[cfg(debug_assertions)]
    conn.execute("PRAGMA mmap_size = 67108864").await?; // 64MB

    #[cfg(not(debug_assertions))]
    conn.execute("PRAGMA mmap_size = 268435456").await?; // 256MB

    conn.execute("PRAGMA synchronous = NORMAL").await?;
    conn.execute("PRAGMA cache_size = -64000").await?;

    Ok(())
}

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open the database at the configured path and bring the schema up to date.
    pub async fn new() -> Result<DBService, Error> {
        Self::new_with_path(&database_path()).await
    }

    pub async fn new_with_path(db_path: &Path) -> Result<DBService, Error> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite://{}", db_path.to_string_lossy());
        let max_connections = max_connections_from_env();

        info!(
            path = %db_path.display(),
            max_connections,
            min_connections = DEFAULT_MIN_CONNECTIONS,
            "Initializing SQLite connection pool"
        );

        let options = SqliteConnectOptions::from_str(&database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(DEFAULT_MIN_CONNECTIONS.min(max_connections))
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .after_connect(|conn, _meta| {
                Box::pin(async move { apply_performance_pragmas(conn).await })
            })
            .connect_with(options)
            .await?;

        if has_pending_migrations(&pool).await {
            info!("Applying pending migrations");
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(DBService { pool })
    }

    /// Fold the WAL back into the main file. Called on shutdown.
    pub async fn checkpoint(&self) -> Result<(), Error> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Cheap liveness check behind the health endpoint.
    pub async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn has_pending_migrations(pool: &Pool<Sqlite>) -> bool {
    let migrator = sqlx::migrate!("./migrations");
    let applied: Vec<i64> =
        match sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations ORDER BY version")
            .fetch_all(pool)
            .await
        {
            Ok(versions) => versions,
            // No ledger yet: fresh database.
            Err(_) => return true,
        };

    migrator
        .iter()
        .any(|migration| !applied.contains(&migration.version))
}
