/// Database layer for OpsDesk
///
/// # Modules
///
/// - `pool`: bounded PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded migration runner
///
/// Models live in the `models` module at crate root.
///
/// # Example
///
/// ```no_run
/// use opsdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use opsdesk_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
