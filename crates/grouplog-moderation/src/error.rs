//! Error types for moderation operations.

use grouplog_store::SinkError;

/// Errors that can occur while building or applying moderation records.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// A group with this id already has a creation record.
    #[error("group '{0}' already exists")]
    GroupAlreadyExists(String),

    /// Group existence could not be determined. Nothing was submitted.
    #[error("failed to look up group '{group_id}': {source}")]
    Lookup {
        group_id: String,
        source: SinkError,
    },

    /// The sink refused or failed to store a record.
    ///
    /// Records submitted earlier in the same batch remain stored.
    #[error("failed to apply event {event_id}: {source}")]
    Apply {
        event_id: String,
        source: SinkError,
    },

    /// A blocking sink or lookup task panicked or was cancelled.
    #[error("moderation task failed: {0}")]
    TaskJoin(String),
}
