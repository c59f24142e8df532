//! # DeepResearch API Server Library
//!
//! HTTP surface of the DeepResearch backend: account registration and login,
//! research session management and the research progress stream.
//!
//! ## Modules
//!
//! - `app`: Application state, router and auth layers
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors for the caller and their sessions
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
