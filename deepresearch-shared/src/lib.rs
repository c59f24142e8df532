//! # DeepResearch Shared Library
//!
//! This crate contains the data layer and authentication primitives used by
//! the DeepResearch API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pooling and embedded migrations
//! - `models`: Database models (users, research sessions) and pagination
//! - `auth`: Password hashing, JWT tokens, the auth service and request identity
//! - `research`: Research progress events streamed to clients

pub mod auth;
pub mod db;
pub mod models;
pub mod research;

/// Current version of the DeepResearch shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
