/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every failure becomes a JSON body of the
/// form `{error, code, message, details?}`, `code` being the HTTP status.
///
/// Internal errors are logged in full and answered with a generic message,
/// so database or hashing details never reach the client.
///
/// # Example
///
/// ```
/// use deepresearch_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(id: Option<u32>) -> ApiResult<Json<Value>> {
///     let id = id.ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deepresearch_shared::auth::{jwt::JwtError, password::PasswordError, service::AuthError};
use deepresearch_shared::models::research_session::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): malformed body, bad path or query parameters
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404), also used for records owned by someone else
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Numeric HTTP status
    pub code: u16,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            code: status.as_u16(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    if db_err.constraint().is_some_and(|c| c.contains("email")) {
                        return ApiError::Conflict(
                            "User with this email already exists".to_string(),
                        );
                    }
                    return ApiError::Conflict("Resource already exists".to_string());
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials
            | AuthError::InvalidFormat
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidToken(_) => ApiError::Unauthorized("Invalid or expired token".to_string()),
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::Database(db_err) => ApiError::from(db_err),
            AuthError::Password(_) | AuthError::TokenCreation(_) | AuthError::Internal(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::ValidationError(_) => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ParseStatusError> for ApiError {
    fn from(err: ParseStatusError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Convert `validator` failures into per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Session not found".to_string());
        assert_eq!(err.to_string(), "Not found: Session not found");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest(String::new()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ValidationError(vec![]).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized(String::new()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound(String::new()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict(String::new()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InternalError(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(ApiError::from(AuthError::EmailTaken), ApiError::Conflict(_)));
        assert!(matches!(ApiError::from(AuthError::UserNotFound), ApiError::Unauthorized(_)));
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken("bad signature".to_string())),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::Internal("join".to_string())),
            ApiError::InternalError(_)
        ));

        match ApiError::from(AuthError::InvalidCredentials) {
            ApiError::Unauthorized(msg) => assert_eq!(msg, "Invalid email or password"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_validation_details() {
        let probe = Probe {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        match ApiError::from(probe.validate().unwrap_err()) {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "email");
                assert_eq!(details[0].message, "Invalid email format");
                assert_eq!(details[1].field, "password");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::InternalError("connection refused to 10.0.0.5".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let body = body_json(ApiError::NotFound("Session not found".to_string()).into_response()).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["code"], 404);
        assert_eq!(body["message"], "Session not found");
    }
}
