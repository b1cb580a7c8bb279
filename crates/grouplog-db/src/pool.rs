//! Connection pool creation and configuration.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

use crate::migrations::{run_migrations, MigrationError};

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when opening the database.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool or check out a connection.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),

    /// The schema could not be brought up to date.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Creates a SQLite connection pool with WAL mode, foreign keys and a busy
/// timeout configured on every connection.
///
/// `db_path` may be [`IN_MEMORY`]. Each SQLite in-memory connection is its
/// own database, so in that case the pool is capped at one connection and
/// every checkout sees the same data.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the pool cannot be created.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let in_memory = db_path == IN_MEMORY;
    let manager = if in_memory {
        SqliteConnectionManager::memory()
    } else {
        SqliteConnectionManager::file(db_path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
    };

    let manager = manager.with_init(move |conn| {
        // In-memory databases report "memory" instead of "wal".
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        if journal_mode != "wal" && journal_mode != "memory" {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("failed to set WAL journal mode, got: {journal_mode}")),
            ));
        }
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};",
            settings.busy_timeout_ms
        ))
    });

    let builder = if in_memory {
        // Recycling the only connection would drop the database with it.
        Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        Pool::builder().max_size(settings.pool_max_size)
    };
    let pool = builder.build(manager)?;
    let max_size = pool.max_size();

    tracing::debug!(path = db_path, max_size, "created sqlite pool");
    Ok(pool)
}

/// Creates a pool and applies pending migrations on one of its connections.
///
/// # Errors
///
/// Returns `PoolError` if the pool cannot be created or a migration fails.
pub fn open_database(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let pool = create_pool(db_path, settings)?;
    {
        let conn = pool.get()?;
        let applied = run_migrations(&conn)?;
        if applied > 0 {
            tracing::info!(count = applied, path = db_path, "applied database migrations");
        }
    }
    Ok(pool)
}
