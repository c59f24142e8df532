/// Database layer for DeepResearch
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool sized from configuration
/// - `migrations`: Embedded migration runner and database lifecycle helpers
///
/// Models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use deepresearch_shared::db::pool::{create_pool, PoolConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = PoolConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
