//! Shared API types and input validation for the grouplog server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grouplog_moderation::ModerationError;
use grouplog_store::SinkError;
use grouplog_types::Event;
use serde::Serialize;
use thiserror::Error;

use crate::config::is_hex_key;

/// Longest accepted group identifier.
pub const MAX_GROUP_ID_LEN: usize = 64;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::GroupAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            ModerationError::Lookup { .. }
            | ModerationError::Apply { .. }
            | ModerationError::TaskJoin(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

impl From<SinkError> for ApiError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Rejected(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

/// Response body for routes that generate moderation records.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Records in the order they were stored.
    pub events: Vec<Event>,
    pub count: usize,
}

impl From<Vec<Event>> for EventsResponse {
    fn from(events: Vec<Event>) -> Self {
        let count = events.len();
        Self { events, count }
    }
}

/// Checks a group identifier: 1 to 64 characters of `a-z`, `0-9`, `-` or `_`.
pub fn validate_group_id(group_id: &str) -> Result<(), ApiError> {
    let well_formed = !group_id.is_empty()
        && group_id.len() <= MAX_GROUP_ID_LEN
        && group_id
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_'));
    if well_formed {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid group id: {group_id}")))
    }
}

pub fn validate_pubkey(pubkey: &str) -> Result<(), ApiError> {
    if is_hex_key(pubkey) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid pubkey: {pubkey}")))
    }
}

pub fn validate_event_id(event_id: &str) -> Result<(), ApiError> {
    if is_hex_key(event_id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid event id: {event_id}")))
    }
}
