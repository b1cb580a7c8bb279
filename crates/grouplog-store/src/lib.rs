//! Append-only event store for the grouplog relay.
//!
//! Every record the relay accepts, whether signed by a client or generated
//! by the moderation core, ends up in the `events` table through an
//! [`EventSink`]. The sink validates the record, indexes it by group, kind
//! and author, and broadcasts it to live subscribers (the SSE stream and any
//! projection pipeline).
//!
//! # Internal calls
//!
//! Records generated by the relay are not signed. They are submitted with
//! [`CallContext::internal`], which tells the sink to skip signature
//! verification while still checking that the id matches the content.
//!
//! ```rust,ignore
//! use grouplog_store::{CallContext, EventSink, SqliteEventStore};
//!
//! let store = SqliteEventStore::new(pool);
//! let appended = store.append(&CallContext::internal(), &event)?;
//! ```

mod error;
mod sink;
mod store;
mod verify;

pub use error::SinkError;
pub use sink::{CallContext, EventSink, GroupLookup, GroupRef};
pub use store::{EventFilter, SqliteEventStore, DEFAULT_NOTIFY_CAPACITY, DEFAULT_QUERY_LIMIT};

#[cfg(test)]
mod tests;
