use std::sync::Arc;

use sqlx::PgPool;

use crate::orchestration::PipelineDeps;
use crate::queue::Queue;
use crate::Config;

/// Everything a request handler needs. Built once in `bin/server.rs` and
/// shared via `axum::extract::State`, mirroring `server::app::AppState` in
/// spirit (one struct, cheaply `Clone`-able, no global statics).
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub pipeline: PipelineDeps,
    pub discovery_queue: Arc<dyn Queue>,
    pub profile_queue: Arc<dyn Queue>,
}
