/// Research progress stream (SSE)
///
/// # Endpoint
///
/// `GET /research/stream?query=<q>`
///
/// # SSE Event Format
///
/// ```text
/// data: {"step":"Starting research...","progress":0,"timestamp":"2025-01-04T12:00:00Z","sources":0,"status":"processing"}
///
/// data: {"step":"Finding relevant sources...","progress":20,"timestamp":"2025-01-04T12:00:01Z","sources":0,"status":"processing"}
/// ```
///
/// Seven events are sent, one per second, the last with `"status":"completed"`.
/// Closing the connection drops the stream and stops emission.
///
/// # Example
///
/// ```bash
/// curl -N -H "Authorization: Bearer <token>" \
///   "http://localhost:8080/research/stream?query=solid-state%20batteries"
/// ```

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use axum::{
    extract::{rejection::QueryRejection, Query},
    response::sse::{Event, KeepAlive, Sse},
};
use deepresearch_shared::research::progress::{progress_stream, DEFAULT_STEP_INTERVAL};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;

/// Stream query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct StreamQuery {
    pub query: Option<String>,
}

/// Stream research progress for `query`
///
/// # Errors
///
/// - `400 Bad Request`: `query` missing or blank
pub async fn stream_research(
    user: CurrentUser,
    params: Result<Query<StreamQuery>, QueryRejection>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Query(params) = params?;

    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter is required".to_string()))?;

    tracing::info!(user_id = %user.user_id, query, "Starting research stream");

    let events = progress_stream(DEFAULT_STEP_INTERVAL).filter_map(|progress| async move {
        match Event::default().json_data(&progress) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!(error = %e, step = %progress.step, "Failed to serialize progress event");
                None
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
