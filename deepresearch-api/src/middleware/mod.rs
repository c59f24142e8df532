/// Middleware for the API server
///
/// Authentication middleware lives in [`crate::app`] next to the router it
/// guards; this module holds the response-shaping layers.

pub mod security;
