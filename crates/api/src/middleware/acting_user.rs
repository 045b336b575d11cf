//! Acting-user extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use docport_core::error::CoreError;
use docport_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the id of the user on whose behalf a request is made.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a mutating request is attributed to.
///
/// Identity is asserted by the fronting gateway through the `X-User-Id`
/// header; this service does not authenticate callers itself.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-User-Id header".into()))
            })?;

        let user_id = raw
            .trim()
            .parse::<DbId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(format!(
                    "Invalid X-User-Id header: '{raw}'"
                )))
            })?;

        Ok(ActingUser { user_id })
    }
}
