//! Stage 1 (Search) artifact: raw SERP rows persisted verbatim, even when
//! empty, so the attempt is recorded and the company is not re-processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row as returned by the search client, persisted inside the
/// artifact's `results` JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerpRow {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl From<search_client::SearchRow> for SerpRow {
    fn from(row: search_client::SearchRow) -> Self {
        Self { title: row.title, link: row.link, snippet: row.snippet }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchArtifact {
    pub id: i64,
    pub company_id: String,
    pub corporate_name: Option<String>,
    pub trade_name: Option<String>,
    pub municipality: Option<String>,
    /// Stored as `jsonb`; decoded into `Vec<SerpRow>` by callers via
    /// `serde_json::from_value`.
    pub results: serde_json::Value,
    pub result_count: i32,
    pub query_used: String,
    pub created_at: DateTime<Utc>,
}

impl SearchArtifact {
    pub fn rows(&self) -> Vec<SerpRow> {
        serde_json::from_value(self.results.clone()).unwrap_or_default()
    }
}
