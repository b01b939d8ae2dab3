//! Ingress HTTP surface (spec §6), versioned under `/v2`, plus an
//! unversioned `/healthz` liveness endpoint. Grounded on
//! `server/app.rs`/`server/main.rs` for the router/middleware shape and on
//! `server/routes/health.rs` for the health check itself.

mod auth;
mod dto;
mod health;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let v2 = Router::new()
        .route("/", get(routes::list_endpoints))
        .route("/serper", post(routes::serper))
        .route("/encontrar_site", post(routes::encontrar_site))
        .route("/scrape", post(routes::scrape))
        .route("/montagem_perfil", post(routes::montagem_perfil))
        .route("/queue_discovery/enqueue", post(routes::enqueue_discovery))
        .route("/queue_discovery/enqueue_batch", post(routes::enqueue_discovery_batch))
        .route("/queue_discovery/metrics", get(routes::metrics_discovery))
        .route("/queue_profile/enqueue", post(routes::enqueue_profile))
        .route("/queue_profile/enqueue_batch", post(routes::enqueue_profile_batch))
        .route("/queue_profile/metrics", get(routes::metrics_profile))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    Router::new()
        .route("/healthz", get(health::health_handler))
        .nest("/v2", v2)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
