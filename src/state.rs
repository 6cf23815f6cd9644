use crate::{config::Config, error::AppError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Storage handle plus configuration. Every operation in `repo` takes the
/// pool explicitly; there is no process-wide database object.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    /// Connects and brings the schema up to date.
    pub async fn init(config: Config) -> Result<Self, AppError> {
        let pool = connect(&config).await?;
        migrate(&pool).await?;
        Ok(Self { pool, config })
    }
}

/// Opens a pool with foreign keys enforced on every connection.
///
/// File databases run in WAL mode so readers do not block the single writer;
/// writers wait up to the busy timeout for the lock instead of failing.
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    // An in-memory database lives only as long as its connection.
    let keep_alive = config.database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !keep_alive {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let max_connections = if keep_alive {
        1
    } else {
        config.max_connections.max(1)
    };

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3));
    if keep_alive {
        pool_options = pool_options
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    pool_options.connect_with(options).await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalServerError(format!("migration failed: {}", e)))
}
