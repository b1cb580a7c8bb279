//! Group administration handlers.
//!
//! Every route here is behind [`crate::middleware::admin_middleware`] and
//! turns one request into moderation records through the shared
//! [`grouplog_moderation::Moderator`].

use crate::api::{
    validate_event_id, validate_group_id, validate_pubkey, ApiError, EventsResponse,
};
use crate::middleware::AdminContext;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use grouplog_store::GroupLookup;
use grouplog_types::EditMetadata;
use serde::Deserialize;
use std::sync::Arc;

/// Request body for `POST /api/groups`.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(rename = "groupId")]
    pub group_id: String,
    /// Initial metadata; every field is optional.
    #[serde(flatten)]
    pub metadata: EditMetadata,
}

/// Request body for `PUT /api/groups/{groupId}/members/{pubkey}`.
#[derive(Debug, Default, Deserialize)]
pub struct PutMemberRequest {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Fails with `404` unless the group has a creation record.
async fn require_group(state: &AppState, group_id: &str) -> Result<(), ApiError> {
    let store = state.store.clone();
    let id = group_id.to_string();
    let group = tokio::task::spawn_blocking(move || store.load_group(&id))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    match group {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("group not found: {group_id}"))),
    }
}

/// Handler for `POST /api/groups`.
///
/// The caller becomes the group's owner.
pub async fn create_group_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(AdminContext(caller)): Extension<AdminContext>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<EventsResponse>), ApiError> {
    validate_group_id(&payload.group_id)?;

    let events = state
        .moderator
        .create_group(&payload.group_id, &caller, &payload.metadata)
        .await?;

    Ok((StatusCode::CREATED, Json(events.into())))
}

/// Handler for `PATCH /api/groups/{groupId}`.
pub async fn edit_metadata_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(metadata): Json<EditMetadata>,
) -> Result<Json<EventsResponse>, ApiError> {
    validate_group_id(&group_id)?;
    if metadata.is_empty() {
        return Err(ApiError::BadRequest(
            "no metadata fields to change".to_string(),
        ));
    }
    require_group(&state, &group_id).await?;

    let events = state.moderator.edit_metadata(&group_id, &metadata).await?;
    Ok(Json(events.into()))
}

/// Handler for `PUT /api/groups/{groupId}/members/{pubkey}`.
///
/// Roles are passed through unchanged; an empty list adds a plain member.
pub async fn put_member_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((group_id, pubkey)): Path<(String, String)>,
    Json(payload): Json<PutMemberRequest>,
) -> Result<Json<EventsResponse>, ApiError> {
    validate_group_id(&group_id)?;
    validate_pubkey(&pubkey)?;
    require_group(&state, &group_id).await?;

    let events = state
        .moderator
        .put_user(&group_id, &pubkey, payload.roles)
        .await?;
    Ok(Json(events.into()))
}

/// Handler for `DELETE /api/groups/{groupId}/members/{pubkey}`.
pub async fn remove_member_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((group_id, pubkey)): Path<(String, String)>,
) -> Result<Json<EventsResponse>, ApiError> {
    validate_group_id(&group_id)?;
    validate_pubkey(&pubkey)?;
    require_group(&state, &group_id).await?;

    let events = state.moderator.remove_user(&group_id, &pubkey).await?;
    Ok(Json(events.into()))
}

/// Handler for `DELETE /api/groups/{groupId}/events/{eventId}`.
pub async fn delete_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((group_id, event_id)): Path<(String, String)>,
) -> Result<Json<EventsResponse>, ApiError> {
    validate_group_id(&group_id)?;
    validate_event_id(&event_id)?;
    require_group(&state, &group_id).await?;

    let events = state.moderator.delete_event(&group_id, &event_id).await?;
    Ok(Json(events.into()))
}
