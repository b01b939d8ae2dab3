//! Stage 2 (Discovery) artifact: the chosen website URL, or an explicit
//! `not_found`/`error` outcome. Upsert semantics — re-running replaces the
//! prior row (see spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum DiscoveryStatus {
    Found,
    NotFound,
    Error,
}

impl std::fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiscoveryStatus::Found => "found",
            DiscoveryStatus::NotFound => "not_found",
            DiscoveryStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscoveryArtifact {
    pub id: i64,
    pub company_id: String,
    pub website_url: Option<String>,
    pub status: DiscoveryStatus,
    pub search_id: Option<i64>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
