/// Research session endpoints
///
/// All routes sit behind the required-auth layer. Handlers addressing a single
/// session take [`OwnedSession`], so by the time they run the caller's
/// ownership has been checked and a foreign session has already produced 404.
///
/// # Endpoints
///
/// - `POST   /research/sessions` - Create a session (201)
/// - `GET    /research/sessions?page=&per_page=&status=` - List own sessions
/// - `GET    /research/sessions/stats` - Count own sessions by status
/// - `GET    /research/sessions/:id` - Fetch one session
/// - `PUT    /research/sessions/:id` - Update title, tags or status
/// - `DELETE /research/sessions/:id` - Soft delete (204)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{CurrentUser, OwnedSession},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use deepresearch_shared::models::{
    pagination::{Page, PageRequest},
    research_session::{
        CreateResearchSession, ResearchSession, SessionStats, SessionStatus, UpdateResearchSession,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create session request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    /// What to research
    #[validate(length(min = 1, message = "Query is required"))]
    pub query: String,

    /// Defaults to the query, cut to the title column width
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub tags: Option<Vec<String>>,
}

/// Update session request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    /// A blank title is ignored
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub tags: Option<Vec<String>>,

    /// One of `pending`, `active`, `completed`, `failed`
    pub status: Option<String>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

/// Session as returned to its owner
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub query: String,
    pub status: SessionStatus,
    pub message_count: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResearchSession> for SessionResponse {
    fn from(session: ResearchSession) -> Self {
        let tags = session.tag_list();
        Self {
            id: session.id,
            user_id: session.user_id,
            title: session.title,
            description: session.description,
            query: session.query,
            status: session.status,
            message_count: session.message_count,
            tags,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// One page of sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsListResponse {
    pub sessions: Vec<SessionResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<Page<ResearchSession>> for SessionsListResponse {
    fn from(page: Page<ResearchSession>) -> Self {
        let total_pages = page.total_pages();
        let page = page.map(SessionResponse::from);

        Self {
            sessions: page.items,
            total: page.total,
            page: page.request.page,
            per_page: page.request.per_page,
            total_pages,
        }
    }
}

/// Blank or missing status means "no filter"
fn parse_status(raw: Option<&str>) -> ApiResult<Option<SessionStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(value.parse::<SessionStatus>()?)),
        None => Ok(None),
    }
}

/// Create a research session
///
/// # Errors
///
/// - `400 Bad Request`: malformed body, empty query, title too long
pub async fn create_session(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Query is required".to_string()));
    }

    let session = ResearchSession::create(
        &state.db,
        CreateResearchSession {
            user_id: user.user_id,
            title: req.title.unwrap_or_default(),
            query: query.to_string(),
            tags: req.tags.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(session_id = %session.id, user_id = %user.user_id, "Research session created");

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// List the caller's sessions, newest first
///
/// # Errors
///
/// - `400 Bad Request`: non-numeric paging values or unknown status
pub async fn list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ListSessionsQuery>, QueryRejection>,
) -> ApiResult<Json<SessionsListResponse>> {
    let Query(params) = query?;

    let status = parse_status(params.status.as_deref())?;
    let request = PageRequest::new(params.page, params.per_page);

    let page = ResearchSession::list_by_owner(&state.db, user.user_id, status, request).await?;

    Ok(Json(page.into()))
}

/// Count the caller's sessions by status
pub async fn session_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<SessionStats>> {
    let stats = ResearchSession::stats_by_owner(&state.db, user.user_id).await?;
    Ok(Json(stats))
}

/// Fetch one of the caller's sessions
pub async fn get_session(OwnedSession { session, .. }: OwnedSession) -> Json<SessionResponse> {
    Json(session.into())
}

/// Update one of the caller's sessions
///
/// # Errors
///
/// - `400 Bad Request`: malformed body, unknown status, title too long
/// - `404 Not Found`: the session was deleted concurrently
pub async fn update_session(
    State(state): State<AppState>,
    OwnedSession { owner, session }: OwnedSession,
    payload: Result<Json<UpdateSessionRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let changes = UpdateResearchSession {
        title: req
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        tags: req.tags,
        status: parse_status(req.status.as_deref())?,
    };

    let updated = ResearchSession::update_owned(&state.db, session.id, owner.user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    tracing::debug!(session_id = %updated.id, "Research session updated");

    Ok(Json(updated.into()))
}

/// Soft-delete one of the caller's sessions
pub async fn delete_session(
    State(state): State<AppState>,
    OwnedSession { owner, session }: OwnedSession,
) -> ApiResult<StatusCode> {
    if !ResearchSession::soft_delete_owned(&state.db, session.id, owner.user_id).await? {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    tracing::info!(session_id = %session.id, user_id = %owner.user_id, "Research session deleted");

    Ok(StatusCode::NO_CONTENT)
}
