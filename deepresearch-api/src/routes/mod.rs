/// API route handlers
///
/// - `health`: Health check and welcome endpoints
/// - `auth`: Registration and login
/// - `sessions`: Research session CRUD, scoped to the caller
/// - `research`: Research progress stream (SSE)

pub mod auth;
pub mod health;
pub mod research;
pub mod sessions;
