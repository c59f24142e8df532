/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account and receive a token
/// - `POST /auth/login` - Exchange credentials for a token
///
/// Both answer with the same body:
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "email": "ada@example.com", "name": "Ada", "role": "user" },
///   "expires_at": "2025-01-05T12:00:00Z"
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use deepresearch_shared::{
    auth::service::IssuedToken,
    models::user::{User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Credentials body shared by register and login
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Display name; required by register, ignored by login
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

/// Token plus the user it was issued to
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: DateTime<Utc>,
}

impl AuthResponse {
    fn new(user: User, issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            user: user.into(),
            expires_at: issued.expires_at,
        }
    }
}

/// Unwraps and validates a credentials body
fn credentials(payload: Result<Json<AuthRequest>, JsonRejection>) -> ApiResult<AuthRequest> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(req)
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: malformed body, invalid email, short password, missing name
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let req = credentials(payload)?;

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Name is required for registration".to_string()))?;

    let user = state.auth.register(&req.email, &req.password, name).await?;
    let issued = state.auth.generate_token(&user)?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, issued))))
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: malformed body or failed validation
/// - `401 Unauthorized`: unknown email or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let req = credentials(payload)?;

    let (user, issued) = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse::new(user, issued)))
}
