//! Contracts between the moderation core and the event store.

use grouplog_types::{Event, Timestamp};
use serde::Serialize;

use crate::error::SinkError;

/// Per-call context passed to an [`EventSink`].
///
/// The only thing it carries is whether the call originates inside the
/// relay. Internal calls skip signature verification and author checks but
/// are indexed and broadcast like any other record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    internal: bool,
}

impl CallContext {
    /// Context for records received from clients.
    pub fn external() -> Self {
        Self { internal: false }
    }

    /// Context for records the relay generates itself.
    pub fn internal() -> Self {
        Self { internal: true }
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

/// Append-only destination for finalized records.
///
/// Implementations may block on I/O; async callers should invoke them from
/// a blocking task.
pub trait EventSink: Send + Sync {
    /// Validates and stores `event`, then notifies downstream consumers.
    ///
    /// Returns `Ok(true)` if the record was appended and `Ok(false)` if a
    /// record with the same id was already present.
    fn append(&self, ctx: &CallContext, event: &Event) -> Result<bool, SinkError>;
}

/// What is known about a group from its creation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub group_id: String,
    /// Author of the create-group record, i.e. the owner.
    pub created_by: String,
    pub creation_event_id: String,
    pub created_at: Timestamp,
}

/// Read access to group existence.
pub trait GroupLookup: Send + Sync {
    /// Returns the group if a creation record for `group_id` exists.
    fn load_group(&self, group_id: &str) -> Result<Option<GroupRef>, SinkError>;
}
