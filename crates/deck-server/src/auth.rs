//! Request identity and access gating.
//!
//! Session management is external: a fronting auth layer resolves the session
//! and forwards the user id in the `x-deck-user` header. A request without it
//! is unauthenticated (401); an authenticated user failing the organization
//! check is forbidden (403).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-deck-user";

/// The authenticated user id, extracted per request.
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| CurrentUser(v.to_string()))
            .ok_or_else(AppError::unauthenticated)
    }
}

/// Gate a read endpoint: creator, any member, or anyone when the organization
/// is creatorless.
pub async fn require_read(
    app: &AppState,
    organization_id: &str,
    user_id: &str,
) -> Result<(), AppError> {
    if deck_core::access::has_read_access(app.store.as_ref(), organization_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::forbidden(organization_id))
    }
}

/// Gate a write endpoint: creator or a non-read-only member.
pub async fn require_write(
    app: &AppState,
    organization_id: &str,
    user_id: &str,
) -> Result<(), AppError> {
    if deck_core::access::has_write_access(app.store.as_ref(), organization_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::forbidden(organization_id))
    }
}
