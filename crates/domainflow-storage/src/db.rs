use domainflow_core::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;

/// Connection and pool-sizing knobs named in the Configuration list (§6).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub statement_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: "sqlite://domainflow.db".to_string(),
            max_connections: 10,
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// Connects the pool and applies every pending migration under
/// `migrations/`. Called once at daemon startup before the worker pool or
/// API layer are allowed to touch the database.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.statement_timeout)
        .connect(&config.url)
        .await?;

    // SQLite-specific durability/concurrency tuning: WAL lets readers and
    // the single writer proceed concurrently, which is what lets the
    // worker pool's `BEGIN IMMEDIATE` lease claims (see domainflow-queue)
    // coexist with API-layer reads without lock-contention errors.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Acquire a connection and open an immediate-mode transaction on it.
///
/// SQLite has no `SELECT ... FOR UPDATE SKIP LOCKED`; `BEGIN IMMEDIATE`
/// takes the writer lock up front instead of on first write, which gives
/// the same "only one transaction wins the row" exclusivity the Job Queue
/// and campaign-counter updates need. Callers must `COMMIT`/`ROLLBACK`
/// explicitly on the returned connection.
pub async fn begin_immediate(
    pool: &SqlitePool,
) -> Result<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(conn)
}
