//! SQLite-backed event sink.
//!
//! All writes go through [`SqliteEventStore::append`], which validates the
//! record, inserts it into the `events` table, and broadcasts it to
//! subscribers. Duplicate ids are ignored rather than rejected, so replays
//! of the same record are harmless.
//!
//! Reads go through [`SqliteEventStore::query_events`], which filters by
//! group, kind, author and time range, oldest first.

use grouplog_db::DbPool;
use grouplog_types::{Event, Kind, Tag, Timestamp};
use rusqlite::{params, types::Type, OptionalExtension, Row};
use tokio::sync::broadcast;

use crate::error::SinkError;
use crate::sink::{CallContext, EventSink, GroupLookup, GroupRef};
use crate::verify::verify_signature;

/// Capacity of the subscriber broadcast channel.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 1024;

const EVENT_COLUMNS: &str = "id, pubkey, created_at, kind, tags_json, content, sig";

/// Event store over a SQLite pool with live fan-out to subscribers.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: DbPool,
    notify: broadcast::Sender<Event>,
}

impl SqliteEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self::with_capacity(pool, DEFAULT_NOTIFY_CAPACITY)
    }

    pub fn with_capacity(pool: DbPool, capacity: usize) -> Self {
        let (notify, _) = broadcast::channel(capacity);
        Self { pool, notify }
    }

    /// Receives every record appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notify.subscribe()
    }

    /// Fetches a single event by id.
    pub fn get_event(&self, id: &str) -> Result<Option<Event>, SinkError> {
        let conn = self.pool.get()?;
        let event = conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                [id],
                map_row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    /// Queries stored events, ordered by `created_at` then append order.
    pub fn query_events(&self, filter: &EventFilter) -> Result<Vec<Event>, SinkError> {
        // Clauses and bind parameters are collected separately so nothing
        // is interpolated into the SQL.
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref group_id) = filter.group_id {
            values.push(Box::new(group_id.clone()));
            clauses.push(format!("group_id = ?{}", values.len()));
        }

        if !filter.kinds.is_empty() {
            let mut placeholders = Vec::with_capacity(filter.kinds.len());
            for kind in &filter.kinds {
                values.push(Box::new(kind.as_u32()));
                placeholders.push(format!("?{}", values.len()));
            }
            clauses.push(format!("kind IN ({})", placeholders.join(", ")));
        }

        if !filter.authors.is_empty() {
            let mut placeholders = Vec::with_capacity(filter.authors.len());
            for author in &filter.authors {
                values.push(Box::new(author.clone()));
                placeholders.push(format!("?{}", values.len()));
            }
            clauses.push(format!("pubkey IN ({})", placeholders.join(", ")));
        }

        if let Some(since) = filter.since {
            values.push(Box::new(to_sql_time(since)?));
            clauses.push(format!("created_at >= ?{}", values.len()));
        }

        if let Some(until) = filter.until {
            values.push(Box::new(to_sql_time(until)?));
            clauses.push(format!("created_at <= ?{}", values.len()));
        }

        if let Some(autogenerated) = filter.autogenerated {
            values.push(Box::new(autogenerated));
            clauses.push(format!("autogenerated = ?{}", values.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        values.push(Box::new(filter.limit.unwrap_or(DEFAULT_QUERY_LIMIT)));
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events {where_clause}
             ORDER BY created_at ASC, seq ASC
             LIMIT ?{}",
            values.len()
        );

        let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| &**p).collect();

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), map_row_to_event)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

impl EventSink for SqliteEventStore {
    fn append(&self, ctx: &CallContext, event: &Event) -> Result<bool, SinkError> {
        if !event.has_valid_id() {
            return Err(SinkError::Rejected(format!(
                "id {} does not match event content",
                event.id()
            )));
        }
        if !ctx.is_internal() {
            verify_signature(event)?;
        }

        let tags_json = serde_json::to_string(event.tags())?;
        let conn = self.pool.get()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO events
                (id, pubkey, kind, created_at, tags_json, content, sig, group_id, autogenerated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.id(),
                event.pubkey(),
                event.kind().as_u32(),
                to_sql_time(event.created_at())?,
                tags_json,
                event.content(),
                event.sig(),
                event.group_id(),
                event.is_autogenerated(),
            ],
        )?;

        if inserted == 0 {
            tracing::debug!(id = event.id(), "duplicate event ignored");
            return Ok(false);
        }

        tracing::debug!(
            id = event.id(),
            kind = event.kind().as_u32(),
            group = event.group_id().unwrap_or(""),
            internal = ctx.is_internal(),
            "event appended"
        );

        // An error here only means nobody is subscribed right now.
        if self.notify.send(event.clone()).is_err() {
            tracing::trace!(id = event.id(), "no subscribers for appended event");
        }

        Ok(true)
    }
}

impl GroupLookup for SqliteEventStore {
    fn load_group(&self, group_id: &str) -> Result<Option<GroupRef>, SinkError> {
        let conn = self.pool.get()?;
        let group = conn
            .query_row(
                "SELECT id, pubkey, created_at FROM events
                 WHERE group_id = ?1 AND kind = ?2
                 ORDER BY created_at ASC, seq ASC
                 LIMIT 1",
                params![group_id, Kind::CreateGroup.as_u32()],
                |row| {
                    Ok(GroupRef {
                        group_id: group_id.to_string(),
                        creation_event_id: row.get(0)?,
                        created_by: row.get(1)?,
                        created_at: from_sql_time(row, 2)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }
}

/// Default row limit for [`EventFilter`].
pub const DEFAULT_QUERY_LIMIT: i64 = 500;

/// Filter criteria for [`SqliteEventStore::query_events`].
///
/// Empty lists and `None` fields do not constrain the query.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub group_id: Option<String>,
    pub kinds: Vec<Kind>,
    pub authors: Vec<String>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<Timestamp>,
    /// Inclusive upper bound on `created_at`.
    pub until: Option<Timestamp>,
    /// Restrict to (or exclude) relay-generated records.
    pub autogenerated: Option<bool>,
    /// Maximum number of events to return (default: 500).
    pub limit: Option<i64>,
}

fn to_sql_time(ts: Timestamp) -> Result<i64, SinkError> {
    i64::try_from(ts.as_u64())
        .map_err(|_| SinkError::Rejected(format!("created_at {ts} is out of range")))
}

fn from_sql_time(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map(Timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn map_row_to_event(row: &Row) -> rusqlite::Result<Event> {
    let tags_json: String = row.get(4)?;
    let tags: Vec<Tag> = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let kind: u32 = row.get(3)?;

    Ok(Event::from_parts(
        row.get(0)?,
        row.get(1)?,
        from_sql_time(row, 2)?,
        Kind::from(kind),
        tags,
        row.get(5)?,
        row.get(6)?,
    ))
}
