//! Admin authorization for the group moderation routes.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// Header naming the caller's pubkey on administration routes.
pub const RELAY_PUBKEY_HEADER: &str = "X-Relay-Pubkey";

/// The authenticated administrator, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AdminContext(pub String);

/// Middleware admitting only configured administrators.
///
/// The caller is identified by the `X-Relay-Pubkey` header. A missing or
/// unreadable header is `401`, a pubkey not in `relay.admin_pubkeys` is `403`.
///
/// # Security Note
///
/// The header is taken at face value. Deployments must put this service
/// behind something that authenticates the caller (NIP-42 AUTH, NIP-98
/// HTTP auth, or a trusted proxy) before forwarding the header.
pub async fn admin_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let caller = req
        .headers()
        .get(RELAY_PUBKEY_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {RELAY_PUBKEY_HEADER} header")))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("unreadable {RELAY_PUBKEY_HEADER} header")))?
        .trim()
        .to_ascii_lowercase();

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?;

    if !state.admin_pubkeys.contains(&caller) {
        tracing::warn!(caller = %caller, path = %req.uri().path(), "non-admin call to admin route");
        return Err(ApiError::Forbidden(
            "caller is not a relay administrator".to_string(),
        ));
    }

    req.extensions_mut().insert(AdminContext(caller));
    Ok(next.run(req).await)
}
