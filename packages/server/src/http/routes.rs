use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::*;
use super::state::AppState;
use crate::orchestration::{stage1_search, stage2_discovery, stage3_scrape, stage4_profile};

/// Wraps any handler failure as a 500 with the error chain rendered, per
/// the same "don't swallow context" instinct as the rest of the pipeline's
/// `anyhow::Context` usage.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

pub async fn list_endpoints() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "endpoints": [
            "POST /v2/serper",
            "POST /v2/encontrar_site",
            "POST /v2/scrape",
            "POST /v2/montagem_perfil",
            "POST /v2/queue_discovery/enqueue",
            "POST /v2/queue_discovery/enqueue_batch",
            "GET /v2/queue_discovery/metrics",
            "POST /v2/queue_profile/enqueue",
            "POST /v2/queue_profile/enqueue_batch",
            "GET /v2/queue_profile/metrics",
            "GET /healthz",
        ],
    }))
}

pub async fn serper(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SerperRequest>,
) -> Result<Json<SerperResponse>, ApiError> {
    let output = stage1_search::run_search(
        &state.pipeline,
        stage1_search::Stage1Input {
            company_id: &req.cnpj_basico,
            corporate_name: req.razao_social.as_deref(),
            trade_name: req.nome_fantasia.as_deref(),
            municipality: req.municipio.as_deref(),
        },
    )
    .await?;

    Ok(Json(SerperResponse {
        success: true,
        serper_id: output.artifact_id,
        results_count: output.result_count,
        query_used: output.query_used,
    }))
}

/// Enqueues stage 2. Idempotent: a company already queued or in flight is
/// reported the same way as a fresh enqueue (spec §6), distinguished only
/// by `enqueued`/`message` in the response body.
pub async fn encontrar_site(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompanyRequest>,
) -> Result<Json<EncontrarSiteResponse>, ApiError> {
    state.discovery_queue.enqueue(&req.cnpj_basico).await?;
    Ok(Json(EncontrarSiteResponse { success: true, cnpj_basico: req.cnpj_basico, status: "accepted" }))
}

pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let started = Instant::now();
    let output = stage3_scrape::run_scrape(&state.pipeline, &req.cnpj_basico, &req.website_url).await?;
    Ok(Json(ScrapeResponse {
        success: true,
        chunks_saved: output.chunks_saved,
        total_tokens: output.total_tokens,
        pages_scraped: output.pages_scraped,
        processing_time_ms: started.elapsed().as_millis(),
    }))
}

/// Stage 4, run in-process. This calls the exact same runner the worker's
/// profile-queue claim loop calls (SPEC_FULL.md §9 decision 1).
pub async fn montagem_perfil(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompanyRequest>,
) -> Result<Json<MontagemPerfilResponse>, ApiError> {
    let started = Instant::now();
    let output = stage4_profile::run_profile_job(&state.pipeline, &req.cnpj_basico).await?;
    let profile_status = if output.profile_written { "written" } else { "skipped" };
    Ok(Json(MontagemPerfilResponse {
        success: true,
        company_id: req.cnpj_basico,
        profile_status,
        chunks_processed: output.chunks_considered,
        processing_time_ms: started.elapsed().as_millis(),
    }))
}

pub async fn enqueue_discovery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    enqueue_one(state.discovery_queue.as_ref(), &req.cnpj_basico).await
}

pub async fn enqueue_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    enqueue_one(state.profile_queue.as_ref(), &req.cnpj_basico).await
}

async fn enqueue_one(
    queue: &dyn crate::queue::Queue,
    company_id: &str,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    let created = queue.enqueue(company_id).await?;
    if created {
        Ok((StatusCode::CREATED, Json(EnqueueResponse { enqueued: true, message: None })))
    } else {
        Ok((
            StatusCode::OK,
            Json(EnqueueResponse { enqueued: false, message: Some("an active job already exists".to_string()) }),
        ))
    }
}

pub async fn enqueue_discovery_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueBatchRequest>,
) -> Result<Json<EnqueueBatchResponse>, ApiError> {
    enqueue_batch(state.discovery_queue.as_ref(), &req.cnpj_basicos).await
}

pub async fn enqueue_profile_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueBatchRequest>,
) -> Result<Json<EnqueueBatchResponse>, ApiError> {
    enqueue_batch(state.profile_queue.as_ref(), &req.cnpj_basicos).await
}

async fn enqueue_batch(
    queue: &dyn crate::queue::Queue,
    company_ids: &[String],
) -> Result<Json<EnqueueBatchResponse>, ApiError> {
    let mut enqueued = 0;
    let mut skipped = 0;
    for company_id in company_ids {
        if queue.enqueue(company_id).await? {
            enqueued += 1;
        } else {
            skipped += 1;
        }
    }
    Ok(Json(EnqueueBatchResponse { enqueued, skipped }))
}

pub async fn metrics_discovery(State(state): State<Arc<AppState>>) -> Result<Json<QueueMetricsResponse>, ApiError> {
    Ok(Json(state.discovery_queue.metrics().await?.into()))
}

pub async fn metrics_profile(State(state): State<Arc<AppState>>) -> Result<Json<QueueMetricsResponse>, ApiError> {
    Ok(Json(state.profile_queue.metrics().await?.into()))
}
