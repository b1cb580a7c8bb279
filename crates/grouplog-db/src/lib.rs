//! Database layer for the grouplog relay.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and embedded SQL migrations for the append-only event table.
//!
//! - **SQLite with WAL mode**: concurrent readers with a single writer,
//!   which matches an append-only log.
//! - **`r2d2` connection pool**: bounded connection reuse shared by the
//!   request handlers and the moderation core.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!` and ship with the code that depends on them.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, open_database, DbPool, DbRuntimeSettings, PoolError, IN_MEMORY};
