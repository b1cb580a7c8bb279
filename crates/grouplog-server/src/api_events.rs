//! Event log API handlers.
//!
//! Provides:
//! - `GET /api/events`: filtered retrieval of stored records
//! - `GET /events/stream`: SSE real-time stream of appended records

use crate::api::{ApiError, EventsResponse};
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::{
        sse::{Event as SseEvent, KeepAlive},
        Sse,
    },
    Json,
};
use futures_util::Stream;
use grouplog_store::EventFilter;
use grouplog_types::{Kind, Timestamp};
use serde::Deserialize;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Largest page `GET /api/events` returns.
pub const MAX_EVENTS_LIMIT: i64 = 1000;

/// Query parameters for `GET /api/events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub group_id: Option<String>,
    /// Numeric event kind, e.g. `9000`.
    pub kind: Option<u32>,
    pub author: Option<String>,
    /// Unix seconds, inclusive.
    pub since: Option<u64>,
    /// Unix seconds, inclusive.
    pub until: Option<u64>,
    /// `true` for relay-generated records only, `false` for client records only.
    pub autogenerated: Option<bool>,
    /// Maximum number of events to return (default: 500, max: 1000).
    pub limit: Option<i64>,
}

/// Handler for `GET /api/events`.
///
/// Returns records ordered by `created_at`, which for moderation records is
/// the order they were generated in. Unauthenticated.
pub async fn get_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    if let (Some(since), Some(until)) = (params.since, params.until) {
        if since > until {
            return Err(ApiError::BadRequest(format!(
                "since ({since}) is after until ({until})"
            )));
        }
    }

    let filter = EventFilter {
        group_id: params.group_id,
        kinds: params.kind.map(Kind::from).into_iter().collect(),
        authors: params.author.into_iter().collect(),
        since: params.since.map(Timestamp),
        until: params.until.map(Timestamp),
        autogenerated: params.autogenerated,
        limit: params.limit.map(|l| l.clamp(1, MAX_EVENTS_LIMIT)),
    };

    let store = state.store.clone();
    let events = tokio::task::spawn_blocking(move || store.query_events(&filter))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(events.into()))
}

/// Query parameters for `GET /events/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Only stream records tagged with this group.
    pub group_id: Option<String>,
}

/// Handler for `GET /events/stream`.
///
/// Streams every newly appended record as an SSE message whose `event` field
/// is the numeric kind and whose data is the record JSON.
pub async fn get_event_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let group_filter = params.group_id;
    let stream = BroadcastStream::new(state.store.subscribe());

    let mapped_stream = stream.filter_map(move |result| match result {
        Ok(event) => {
            if let Some(ref group) = group_filter {
                if event.group_id() != Some(group.as_str()) {
                    return None;
                }
            }

            match serde_json::to_string(&event) {
                Ok(data) => Some(Ok(SseEvent::default()
                    .id(event.id())
                    .event(event.kind().to_string())
                    .data(data))),
                Err(e) => {
                    tracing::error!("failed to serialize stored event: {}", e);
                    None
                }
            }
        }
        Err(broadcast_error) => {
            tracing::warn!(
                error = %broadcast_error,
                "event SSE stream lagged; events were dropped for this subscriber"
            );
            None
        }
    });

    Sse::new(mapped_stream).keep_alive(KeepAlive::default())
}
