/// Health check and welcome endpoints
///
/// # Endpoints
///
/// ```text
/// GET /health
/// GET /
/// ```
///
/// # Health Response
///
/// ```json
/// {
///   "status": "healthy",
///   "timestamp": "2025-01-04T12:00:00Z",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use deepresearch_shared::{auth::middleware::AuthContext, db::pool};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub timestamp: DateTime<Utc>,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

/// Health check handler
///
/// Always answers 200; a failed `SELECT 1` only downgrades the status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, database) = match pool::health_check(&state.db).await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ("degraded", "disconnected")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

/// Welcome response
#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,

    /// Present when the request carried a valid token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Welcome handler, personalised when the caller is signed in
pub async fn home(auth: Option<Extension<AuthContext>>) -> Json<WelcomeResponse> {
    let (message, user) = match auth {
        Some(Extension(ctx)) => (format!("Welcome back to DeepResearch, {}", ctx.email), Some(ctx.email)),
        None => ("Welcome to DeepResearch".to_string(), None),
    };

    Json(WelcomeResponse {
        message,
        version: env!("CARGO_PKG_VERSION").to_string(),
        user,
    })
}
