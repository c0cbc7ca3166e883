/// PostgreSQL connection pool management
///
/// All request handling shares one bounded pool; concurrency against the
/// database is capped by `max_connections`, and requests queue (up to the
/// acquire timeout) rather than opening new connections under load.
///
/// # Example
///
/// ```no_run
/// use opsdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let config = DatabaseConfig {
///     url: std::env::var("DATABASE_URL").unwrap(),
///     ..Default::default()
/// };
///
/// let pool = create_pool(config).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the database connection pool
///
/// Timeouts are in seconds so they map directly onto environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections; this is the effective cap on
    /// concurrent database work
    pub max_connections: u32,

    /// Idle connections kept warm
    pub min_connections: u32,

    /// How long a request waits for a free connection before failing
    pub acquire_timeout_seconds: u64,

    /// Idle time before a connection is closed; `None` keeps idle
    /// connections forever
    pub idle_timeout_seconds: Option<u64>,

    /// Forced recycling age for connections; `None` disables recycling
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates the connection pool and verifies the database is reachable
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database cannot be reached,
/// or the startup health check fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = pool_options.connect(&config.url).await?;

    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Verifies the database answers a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("Running database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        Ok(())
    } else {
        warn!(value = result.0, "Health check returned unexpected value");
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Point-in-time pool occupancy, reported by the health endpoint
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Connections currently executing queries
    pub active_connections: usize,

    /// Connections idle and ready
    pub idle_connections: usize,

    /// All open connections
    pub total_connections: usize,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle();

    PoolStats {
        active_connections: (size as usize).saturating_sub(idle),
        idle_connections: idle,
        total_connections: size as usize,
    }
}

/// Drains and closes the pool during shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout_seconds, 30);
        assert_eq!(config.idle_timeout_seconds, Some(600));
        assert_eq!(config.max_lifetime_seconds, Some(1800));
    }

    // Pool creation and health checks need a running database; those live
    // in the integration tests.
}
