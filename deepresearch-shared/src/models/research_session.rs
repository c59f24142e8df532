/// Research session model and database operations
///
/// Every query in this module takes the owning user's ID and binds it in the
/// `WHERE` clause. There is no lookup by session ID alone: a
/// session that belongs to someone else behaves exactly like one that does
/// not exist.
///
/// Tags are stored as a JSON array in a text column. Decoding never fails; a
/// malformed value reads back as an empty list.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE session_status AS ENUM ('pending', 'active', 'completed', 'failed');
///
/// CREATE TABLE research_sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     query TEXT NOT NULL,
///     tags TEXT NOT NULL DEFAULT '[]',
///     status session_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use deepresearch_shared::models::pagination::PageRequest;
/// use deepresearch_shared::models::research_session::{CreateResearchSession, ResearchSession};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let session = ResearchSession::create(
///     &pool,
///     CreateResearchSession {
///         user_id: owner,
///         title: String::new(),
///         query: "state of solid-state batteries".to_string(),
///         tags: vec!["energy".to_string()],
///     },
/// )
/// .await?;
///
/// let page = ResearchSession::list_by_owner(&pool, owner, None, PageRequest::default()).await?;
/// assert_eq!(page.items[0].id, session.id);
/// # Ok(())
/// # }
/// ```

use super::pagination::{Page, PageRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Columns read back for every session, `s` being the session row.
///
/// `message_count` is derived so the response never drifts from the
/// messages table.
const SESSION_COLUMNS: &str = "s.id, s.user_id, s.title, s.description, s.query, s.tags, \
     s.status, \
     (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id) AS message_count, \
     s.created_at, s.updated_at, s.deleted_at";

/// Lifecycle status of a research session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, research not started
    #[default]
    Pending,

    /// Research in progress
    Active,

    /// Research finished
    Completed,

    /// Research failed
    Failed,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Pending,
        SessionStatus::Active,
        SessionStatus::Completed,
        SessionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session status '{0}', expected one of: pending, active, completed, failed")]
pub struct ParseStatusError(pub String);

impl FromStr for SessionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A research session row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchSession {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub title: String,

    pub description: String,

    /// Free-text research query
    pub query: String,

    /// JSON-encoded tag list; read it through [`ResearchSession::tag_list`]
    pub tags: String,

    pub status: SessionStatus,

    /// Number of messages recorded for this session
    pub message_count: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateResearchSession {
    pub user_id: Uuid,

    /// Falls back to the query when blank
    pub title: String,

    pub query: String,

    pub tags: Vec<String>,
}

/// Fields to change on a session. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateResearchSession {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<SessionStatus>,
}

/// Per-owner session counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionStats {
    pub total: i64,
    pub pending: i64,
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Serializes a tag list for the text column
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Parses the text column back into a tag list
///
/// Empty, `null` and malformed values all read as an empty list.
pub fn decode_tags(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Option<Vec<String>>>(raw) {
        Ok(tags) => tags.unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "Stored tags are not a JSON string array");
            Vec::new()
        }
    }
}

/// Width of the `title` column, in characters
pub const MAX_TITLE_LEN: usize = 255;

fn default_description(query: &str) -> String {
    format!("Research session for: {}", query)
}

/// Title used when none is given: the query, cut to the column width
fn fallback_title(query: &str) -> String {
    query.chars().take(MAX_TITLE_LEN).collect()
}

impl ResearchSession {
    /// Decoded tag list
    pub fn tag_list(&self) -> Vec<String> {
        decode_tags(&self.tags)
    }

    /// Inserts a new session for `data.user_id`
    pub async fn create(pool: &PgPool, data: CreateResearchSession) -> Result<Self, sqlx::Error> {
        let title = if data.title.trim().is_empty() {
            fallback_title(&data.query)
        } else {
            data.title
        };

        let query = format!(
            "WITH s AS (
                INSERT INTO research_sessions (user_id, title, description, query, tags)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
             )
             SELECT {SESSION_COLUMNS} FROM s"
        );

        sqlx::query_as::<_, ResearchSession>(&query)
            .bind(data.user_id)
            .bind(title)
            .bind(default_description(&data.query))
            .bind(&data.query)
            .bind(encode_tags(&data.tags))
            .fetch_one(pool)
            .await
    }

    /// Finds a live session owned by `user_id`
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {SESSION_COLUMNS}
             FROM research_sessions s
             WHERE s.id = $1 AND s.user_id = $2 AND s.deleted_at IS NULL"
        );

        sqlx::query_as::<_, ResearchSession>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists an owner's sessions, newest first
    ///
    /// `status`, when given, restricts both the page and the total.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<SessionStatus>,
        page: PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM research_sessions
             WHERE user_id = $1
               AND deleted_at IS NULL
               AND ($2::session_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {SESSION_COLUMNS}
             FROM research_sessions s
             WHERE s.user_id = $1
               AND s.deleted_at IS NULL
               AND ($2::session_status IS NULL OR s.status = $2)
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT $3 OFFSET $4"
        );

        let items = sqlx::query_as::<_, ResearchSession>(&query)
            .bind(user_id)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    /// Applies `data` to a session owned by `user_id`
    ///
    /// Runs as one statement and returns the row as written, so there is no
    /// window between the update and the read. Returns `None` when the owner
    /// has no such live session.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateResearchSession,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "WITH s AS (
                UPDATE research_sessions
                SET title = COALESCE($3, title),
                    tags = COALESCE($4, tags),
                    status = COALESCE($5, status),
                    updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
                RETURNING *
             )
             SELECT {SESSION_COLUMNS} FROM s"
        );

        sqlx::query_as::<_, ResearchSession>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.tags.as_deref().map(encode_tags))
            .bind(data.status)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deletes a session owned by `user_id`
    ///
    /// Returns false when the owner has no such live session.
    pub async fn soft_delete_owned(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE research_sessions
             SET deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts an owner's live sessions by status
    pub async fn stats_by_owner(pool: &PgPool, user_id: Uuid) -> Result<SessionStats, sqlx::Error> {
        sqlx::query_as::<_, SessionStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'active') AS active,
                    COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                    COUNT(*) FILTER (WHERE status = 'failed') AS failed
             FROM research_sessions
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
