//! grouplog server library logic.

pub mod api;
pub mod api_events;
pub mod api_groups;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use grouplog_db::DbPool;
use grouplog_moderation::{LogicalClock, Moderator, OrderingSerializer};
use grouplog_store::SqliteEventStore;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event store; also the sink moderation records are applied to.
    pub store: Arc<SqliteEventStore>,
    /// Generates and applies moderation records.
    pub moderator: Arc<Moderator>,
    /// Pubkeys admitted by [`middleware::admin_middleware`].
    pub admin_pubkeys: Arc<HashSet<String>>,
}

impl AppState {
    /// Wires the store, the logical clock and the moderator around `pool`.
    ///
    /// Creates one clock for the relay identity. Build one `AppState` per
    /// process and clone it.
    pub fn new<I>(pool: DbPool, relay_pubkey: &str, admin_pubkeys: I, serial_reset: Duration) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let store = Arc::new(SqliteEventStore::new(pool));
        let clock = Arc::new(LogicalClock::new(serial_reset));
        let serializer = OrderingSerializer::new(store.clone(), clock, relay_pubkey);
        let moderator = Moderator::new(serializer, store.clone());

        Self {
            store,
            moderator: Arc::new(moderator),
            admin_pubkeys: Arc::new(admin_pubkeys.into_iter().collect()),
        }
    }
}

/// Maximum request body size (64 KiB). Moderation requests are small.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/groups", post(api_groups::create_group_handler))
        .route(
            "/api/groups/{groupId}",
            patch(api_groups::edit_metadata_handler),
        )
        .route(
            "/api/groups/{groupId}/members/{pubkey}",
            put(api_groups::put_member_handler).delete(api_groups::remove_member_handler),
        )
        .route(
            "/api/groups/{groupId}/events/{eventId}",
            delete(api_groups::delete_event_handler),
        )
        .layer(axum::middleware::from_fn(middleware::admin_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/events", get(api_events::get_events_handler))
        .route("/events/stream", get(api_events::get_event_stream_handler))
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
