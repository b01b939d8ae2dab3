//! Request/response shapes for the `/v2` surface (spec §6). Field names
//! follow the wire contract verbatim (snake_case, Portuguese business
//! terms) rather than the Rust-internal `CompanyId`/`company_id` naming
//! used elsewhere.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SerperRequest {
    pub cnpj_basico: String,
    pub razao_social: Option<String>,
    pub nome_fantasia: Option<String>,
    pub municipio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SerperResponse {
    pub success: bool,
    pub serper_id: i64,
    pub results_count: usize,
    pub query_used: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub cnpj_basico: String,
}

#[derive(Debug, Serialize)]
pub struct EncontrarSiteResponse {
    pub success: bool,
    pub cnpj_basico: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub cnpj_basico: String,
    pub website_url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub chunks_saved: usize,
    pub total_tokens: i64,
    pub pages_scraped: usize,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct MontagemPerfilResponse {
    pub success: bool,
    pub company_id: String,
    pub profile_status: &'static str,
    pub chunks_processed: usize,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub enqueued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueBatchRequest {
    pub cnpj_basicos: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueBatchResponse {
    pub enqueued: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct QueueMetricsResponse {
    pub queued_count: i64,
    pub processing_count: i64,
    pub failed_count: i64,
    pub oldest_job_age_seconds: Option<f64>,
}

impl From<crate::queue::QueueMetrics> for QueueMetricsResponse {
    fn from(m: crate::queue::QueueMetrics) -> Self {
        Self {
            queued_count: m.queued,
            processing_count: m.processing,
            failed_count: m.failed,
            oldest_job_age_seconds: m.oldest_queued_age_seconds,
        }
    }
}
