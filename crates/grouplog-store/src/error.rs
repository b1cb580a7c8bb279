//! Error types for the event store.

/// Errors returned by event sinks and group lookups.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The record failed validation and was not stored.
    #[error("event rejected: {0}")]
    Rejected(String),

    /// A database operation failed.
    #[error("event store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be checked out.
    #[error("event store pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization or deserialization of tags failed.
    #[error("event store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
