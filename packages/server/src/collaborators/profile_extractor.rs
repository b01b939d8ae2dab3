//! `ProfileExtractor`: `(chunkText) -> partialProfile`.

use async_trait::async_trait;
use llm_pool::{CallOptions, ChatMessage, Priority, ProviderPool};

use crate::models::ProfileArtifact;

#[async_trait]
pub trait ProfileExtractor: Send + Sync {
    async fn extract(&self, chunk_text: &str) -> anyhow::Result<ProfileArtifact>;
}

/// LLM-backed default. The field-level extraction prompt and
/// Portuguese-specific normalization are a plug-in (spec §1); this asks
/// for the same JSON shape [`ProfileArtifact`] serializes to and trusts
/// `serde` to fill in whatever the model actually returned.
pub struct LlmProfileExtractor {
    pool: std::sync::Arc<ProviderPool>,
}

impl LlmProfileExtractor {
    pub fn new(pool: std::sync::Arc<ProviderPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileExtractor for LlmProfileExtractor {
    async fn extract(&self, chunk_text: &str) -> anyhow::Result<ProfileArtifact> {
        let prompt = format!(
            "Extract a business profile from the following website content. \
             Reply with JSON matching: company_name, cnpj, description, founding_year, \
             employee_range, industry, business_model, target_audience, geographic_coverage, \
             products (array of {{category, items}}), services (array of {{name, description}}), \
             certifications (string array), awards (string array), partnerships (string array), \
             client_list (string array), emails (string array), phones (string array), \
             linkedin_url, website_url, headquarters_address, locations (array of {{address}}). \
             Leave fields null/empty if not present in the text. Do not invent information.\n\n{chunk_text}"
        );

        let messages = [ChatMessage::user(prompt)];
        let opts = CallOptions { response_format_json: true, ..Default::default() };
        let response = self.pool.call_with_fallback(&messages, opts, Priority::Normal).await?;

        let mut profile: ProfileArtifact =
            serde_json::from_str(&response.content).unwrap_or_default();
        profile.sources = Vec::new();
        Ok(profile)
    }
}
