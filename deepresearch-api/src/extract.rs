//! Request extractors.

use crate::{app::AppState, error::ApiError};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Extension,
};
use deepresearch_shared::{auth::middleware::AuthContext, models::research_session::ResearchSession};
use std::ops::Deref;
use uuid::Uuid;

/// The caller's identity, as established by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl Deref for CurrentUser {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Extension(auth) = Extension::<AuthContext>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(CurrentUser(auth))
    }
}

/// A research session from the `:id` path segment that belongs to the caller.
///
/// Ownership is resolved here, once per request: a session owned by someone
/// else is rejected exactly like a missing one, with 404. A path segment that
/// is not a UUID is rejected with 400.
#[derive(Debug, Clone)]
pub struct OwnedSession {
    pub owner: AuthContext,
    pub session: ResearchSession,
}

#[async_trait]
impl FromRequestParts<AppState> for OwnedSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(owner) = CurrentUser::from_request_parts(parts, state).await?;

        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid session ID".to_string()))?;

        let session = ResearchSession::find_owned(&state.db, id, owner.user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(session_id = %id, user_id = %owner.user_id, "Session not found for caller");
                ApiError::NotFound("Session not found".to_string())
            })?;

        Ok(OwnedSession { owner, session })
    }
}
