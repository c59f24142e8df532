/// Database models for DeepResearch
///
/// # Models
///
/// - `user`: User accounts (the credential store)
/// - `research_session`: Research sessions, always queried through their owner
/// - `pagination`: Offset pagination shared by list queries
///
/// Messages, thoughts, sources, documents and summaries exist in the schema
/// only; no model reads or writes them beyond counting a session's messages.

pub mod pagination;
pub mod research_session;
pub mod user;
