//! # DeepResearch API Server
//!
//! Loads configuration, connects to PostgreSQL, applies migrations and serves
//! the HTTP API until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) \
//! DATABASE_URL=postgres://postgres@localhost:5432/deepresearch \
//! cargo run -p deepresearch-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to override the
//! default filter.

use anyhow::Context;
use deepresearch_api::{
    app::{build_router, AppState},
    config::Config,
};
use deepresearch_shared::db::{migrations::run_migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "deepresearch_api=debug,deepresearch_shared=info,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("DeepResearch API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let db = pool::create_pool(config.database.pool_config())
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let address = config.bind_address();
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}
