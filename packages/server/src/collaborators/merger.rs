//! `Merger`: `([partialProfile]) -> mergedProfile`.

use async_trait::async_trait;
use llm_pool::{CallOptions, ChatMessage, Priority, ProviderPool};

use crate::models::ProfileArtifact;

#[async_trait]
pub trait Merger: Send + Sync {
    async fn merge(&self, partials: &[ProfileArtifact]) -> anyhow::Result<ProfileArtifact>;
}

/// LLM-backed default: asks the model to reconcile N partial profiles
/// (deduplicating products/services/contacts) into one. Field-level
/// merge/normalization heuristics (e.g. collapsing "Petrobras" and "Grupo
/// Petrobras") are a plug-in per spec §1.
pub struct LlmMerger {
    pool: std::sync::Arc<ProviderPool>,
}

impl LlmMerger {
    pub fn new(pool: std::sync::Arc<ProviderPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Merger for LlmMerger {
    async fn merge(&self, partials: &[ProfileArtifact]) -> anyhow::Result<ProfileArtifact> {
        if partials.is_empty() {
            return Ok(ProfileArtifact::default());
        }
        if partials.len() == 1 {
            return Ok(partials[0].clone());
        }

        let serialized = serde_json::to_string(partials)?;
        let prompt = format!(
            "Merge the following partial business profiles (extracted from different pages of the \
             same company's website) into a single profile with the same JSON shape, deduplicating \
             overlapping products, services, emails, phones, and partner names:\n\n{serialized}"
        );

        let messages = [ChatMessage::user(prompt)];
        let opts = CallOptions { response_format_json: true, ..Default::default() };
        let response = self.pool.call_with_fallback(&messages, opts, Priority::Normal).await?;

        // The first-non-empty-partial fallback lives at the orchestration
        // level (stage4_profile::run_profile_job), not here, so that any
        // `Merger` impl's errors, not just this one's JSON-parse failures,
        // get the same recovery (spec §4.4 step 4).
        let merged = serde_json::from_str(&response.content)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_partial_short_circuits_without_a_network_call() {
        let pool = std::sync::Arc::new(ProviderPool::new(Vec::new()));
        let merger = LlmMerger::new(pool);
        let mut single = ProfileArtifact::default();
        single.company_name = Some("Acme".to_string());

        let merged = merger.merge(std::slice::from_ref(&single)).await.unwrap();
        assert_eq!(merged.company_name, single.company_name);
    }
}
