/// Request authentication for Axum
///
/// Extracts the bearer token from the `Authorization` header, validates it and
/// resolves the user it names. The HTTP layer wraps [`authenticate`] in two
/// modes:
///
/// - **required**: any failure ends the request with 401
/// - **optional**: any failure lets the request through without identity
///
/// On success an [`AuthContext`] is inserted into request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::{Request, State}, middleware::Next, response::{IntoResponse, Response}};
/// use deepresearch_shared::auth::{middleware::authenticate, service::AuthService};
///
/// async fn require_auth(
///     State(auth): State<AuthService>,
///     mut req: Request,
///     next: Next,
/// ) -> Response {
///     match authenticate(&auth, req.headers()).await {
///         Ok(ctx) => {
///             req.extensions_mut().insert(ctx);
///             next.run(req).await
///         }
///         Err(e) => (e.status_code(), e.to_string()).into_response(),
///     }
/// }
/// ```

use super::service::{AuthError, AuthService};
use crate::models::user::{User, UserRole};
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller, added to request extensions
///
/// ```
/// use axum::Extension;
/// use deepresearch_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}", auth.email)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`
///
/// The scheme is matched case-insensitively; an empty token is a format error.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Validates the request's bearer token and loads its user
///
/// # Errors
///
/// - `MissingCredentials` / `InvalidFormat` for a bad header
/// - `InvalidToken` for a bad signature, issuer or validity window
/// - `UserNotFound` if the user was deleted after the token was issued
pub async fn authenticate(auth: &AuthService, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = auth.validate_token(token)?;
    let user = auth.get_user(claims.sub).await?;

    Ok(AuthContext::from(&user))
}
