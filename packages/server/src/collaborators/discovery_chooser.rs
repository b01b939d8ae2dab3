//! `DiscoveryChooser`: `(metadata, candidateRows) -> (url | null, confidence, reasoning)`.

use async_trait::async_trait;
use llm_pool::{CallOptions, ChatMessage, Priority, ProviderPool};

use crate::models::SerpRow;

pub struct DiscoveryInput<'a> {
    pub company_id: &'a str,
    pub corporate_name: Option<&'a str>,
    pub trade_name: Option<&'a str>,
    pub municipality: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryChoice {
    pub url: Option<String>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

/// Chooses, from deduplicated and blacklist-filtered SERP rows, the URL
/// that canonically represents a company.
#[async_trait]
pub trait DiscoveryChooser: Send + Sync {
    async fn choose(
        &self,
        input: DiscoveryInput<'_>,
        candidates: &[SerpRow],
    ) -> anyhow::Result<DiscoveryChoice>;
}

/// LLM-backed default. This is intentionally thin: the prompt text itself
/// (schema-specific wording, few-shot examples, Portuguese phrasing) is a
/// plug-in per spec §1 — callers that need production-grade discovery
/// prompts should supply their own `DiscoveryChooser`.
pub struct LlmDiscoveryChooser {
    pool: std::sync::Arc<ProviderPool>,
}

impl LlmDiscoveryChooser {
    pub fn new(pool: std::sync::Arc<ProviderPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscoveryChooser for LlmDiscoveryChooser {
    async fn choose(
        &self,
        input: DiscoveryInput<'_>,
        candidates: &[SerpRow],
    ) -> anyhow::Result<DiscoveryChoice> {
        let listing: String = candidates
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{}. {} - {} - {}", i + 1, row.title, row.link, row.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Company {company_id} ({trade_name} / {corporate_name}) in {municipality}.\n\
             Candidate search results:\n{listing}\n\n\
             Reply with JSON {{\"url\": string|null, \"confidence\": number, \"reasoning\": string}} \
             naming the single result that is this company's own official website, or null if none is.",
            company_id = input.company_id,
            trade_name = input.trade_name.unwrap_or("?"),
            corporate_name = input.corporate_name.unwrap_or("?"),
            municipality = input.municipality.unwrap_or("?"),
        );

        let messages = [ChatMessage::user(prompt)];
        let opts = CallOptions { response_format_json: true, ..Default::default() };
        let response = self.pool.call_with_fallback(&messages, opts, Priority::High).await?;

        let parsed: serde_json::Value = serde_json::from_str(&response.content)
            .unwrap_or_else(|_| serde_json::json!({"url": null, "confidence": null, "reasoning": null}));

        Ok(DiscoveryChoice {
            url: parsed.get("url").and_then(|v| v.as_str()).map(str::to_string),
            confidence: parsed.get("confidence").and_then(|v| v.as_f64()),
            reasoning: parsed.get("reasoning").and_then(|v| v.as_str()).map(str::to_string),
        })
    }
}
