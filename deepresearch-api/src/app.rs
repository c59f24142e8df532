/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use deepresearch_api::{app::{build_router, AppState}, config::Config};
/// use deepresearch_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use deepresearch_shared::auth::{
    middleware::authenticate,
    service::{AuthError, AuthService},
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through `State`; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Registration, login and token validation
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let auth = AuthService::new(db.clone(), config.jwt.secret.clone(), config.jwt.expiry_hours);

        Self {
            db,
            config: Arc::new(config),
            auth,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /                              # Welcome (optional auth)
/// ├── GET  /health                        # Health check (public)
/// ├── /auth/                              # Public
/// │   ├── POST /register
/// │   └── POST /login
/// └── /research/                          # Bearer token required
///     ├── GET    /stream?query=
///     ├── POST   /sessions
///     ├── GET    /sessions?page=&per_page=&status=
///     ├── GET    /sessions/stats
///     ├── GET    /sessions/:id
///     ├── PUT    /sessions/:id
///     └── DELETE /sessions/:id
/// ```
///
/// Outer layers, applied to every route: security headers, CORS, request
/// tracing.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let welcome_routes = Router::new()
        .route("/", get(routes::health::home))
        .route_layer(from_fn_with_state(state.clone(), optional_auth_layer));

    let research_routes = Router::new()
        .route("/stream", get(routes::research::stream_research))
        .route(
            "/sessions",
            post(routes::sessions::create_session).get(routes::sessions::list_sessions),
        )
        .route("/sessions/stats", get(routes::sessions::session_stats))
        .route(
            "/sessions/:id",
            get(routes::sessions::get_session)
                .put(routes::sessions::update_session)
                .delete(routes::sessions::delete_session),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth_layer));

    Router::new()
        .merge(public_routes)
        .merge(welcome_routes)
        .nest("/research", research_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.server.production))
        .with_state(state)
}

/// Permissive when the origin list contains `*`, otherwise an allow-list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Rejects the request with 401 unless it carries a valid bearer token for a
/// live user; on success the caller's `AuthContext` is added to extensions.
async fn require_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&state.auth, req.headers())
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, path = %req.uri().path(), "Authentication failed");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}

/// Adds the caller's `AuthContext` when a valid token is present and lets the
/// request through either way.
async fn optional_auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(&state.auth, req.headers()).await {
        Ok(auth_context) => {
            req.extensions_mut().insert(auth_context);
        }
        Err(AuthError::MissingCredentials) => {}
        Err(e) => {
            tracing::debug!(error = %e, "Continuing without identity");
        }
    }

    next.run(req).await
}
