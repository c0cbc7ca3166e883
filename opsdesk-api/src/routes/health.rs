/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use opsdesk_shared::db::pool::{get_pool_stats, health_check as db_health_check};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status: "connected" or "disconnected"
    pub database: String,

    /// Pooled connections currently open
    pub pool_connections: usize,
}

/// Reports liveness and database connectivity
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match db_health_check(&state.db).await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    let stats = get_pool_stats(&state.db);

    Ok(Json(HealthResponse {
        status: if database == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        pool_connections: stats.total_connections,
    }))
}
