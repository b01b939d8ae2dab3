//! Stage 3 (Scrape) artifact: ordered content chunks. All chunks for one
//! company are written in a single transaction (see spec §3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChunkArtifact {
    pub id: i64,
    pub company_id: String,
    pub website_url: String,
    pub chunk_index: i32,
    pub total_chunks: i32,
    pub content: String,
    pub token_count: i32,
    /// First five source page URLs this chunk spans.
    pub source_urls: serde_json::Value,
    /// Best-effort, nullable link back to the discovery row that chose
    /// `website_url`. Not a hard foreign key — traceability only.
    pub discovery_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl ChunkArtifact {
    pub fn source_urls_vec(&self) -> Vec<String> {
        serde_json::from_value(self.source_urls.clone()).unwrap_or_default()
    }
}

/// An unpersisted chunk, produced by the [`crate::collaborators::Chunker`]
/// before stage 3 enriches and batch-inserts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChunk {
    pub index: i32,
    pub total: i32,
    pub content: String,
    pub tokens: i32,
    pub pages_included: Vec<String>,
}
