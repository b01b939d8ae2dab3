//! Process/database liveness, grounded on
//! `server/routes/health.rs::health_handler` — a timeout-wrapped `SELECT
//! 1` plus pool occupancy, reduced to this pipeline's simpler shape (no
//! event bus to report on).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: DatabaseHealth,
    connection_pool: ConnectionPoolHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct ConnectionPoolHealth {
    size: u32,
    idle_connections: usize,
    max_connections: u32,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let db_health = match tokio::time::timeout(Duration::from_secs(5), sqlx::query("SELECT 1").execute(&state.db)).await
    {
        Ok(Ok(_)) => DatabaseHealth { status: "ok".to_string(), error: None },
        Ok(Err(e)) => DatabaseHealth { status: "error".to_string(), error: Some(format!("query failed: {e}")) },
        Err(_) => DatabaseHealth { status: "error".to_string(), error: Some("query timeout (>5s)".to_string()) },
    };

    let pool_options = state.db.options();
    let pool_health = ConnectionPoolHealth {
        size: state.db.size(),
        idle_connections: state.db.num_idle(),
        max_connections: pool_options.get_max_connections(),
    };

    let is_healthy = db_health.status == "ok";
    let status_code = if is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            database: db_health,
            connection_pool: pool_health,
        }),
    )
}
