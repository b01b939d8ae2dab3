//! OpenAI-chat-completions-compatible wire call, shared by every provider
//! in the pool (each just varies endpoint/model/credential).

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{CallOptions, ChatMessage, ChatRequest, ChatResponse, ProviderRecord, ResponseFormat};

pub(crate) async fn call_provider(
    http: &reqwest::Client,
    provider: &ProviderRecord,
    messages: &[ChatMessage],
    opts: &CallOptions,
) -> Result<(String, u64), LlmError> {
    let timeout = opts.timeout.unwrap_or(provider.timeout);
    let request = ChatRequest {
        model: &provider.model,
        messages,
        temperature: opts.temperature,
        response_format: opts.response_format_json.then_some(ResponseFormat { kind: "json_object" }),
    };

    let started = Instant::now();
    let response = http
        .post(format!("{}/chat/completions", provider.endpoint))
        .header("Authorization", format!("Bearer {}", provider.api_key))
        .json(&request)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout { provider: provider.name.clone() }
            } else {
                LlmError::Generic { provider: provider.name.clone(), message: e.to_string() }
            }
        })?;
    let latency = started.elapsed();

    let status = response.status();
    if status.as_u16() == 429 {
        let body = response.text().await.unwrap_or_default();
        warn!(provider = %provider.name, "LLM provider rate limited");
        return Err(LlmError::RateLimit { provider: provider.name.clone(), message: body });
    }
    if status.as_u16() >= 400 && status.as_u16() < 500 {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::BadRequest { provider: provider.name.clone(), message: body });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Generic { provider: provider.name.clone(), message: body });
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| LlmError::Generic { provider: provider.name.clone(), message: e.to_string() })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| LlmError::EmptyResponse { provider: provider.name.clone() })?;

    debug!(provider = %provider.name, latency_ms = latency.as_millis() as u64, "LLM call ok");
    Ok((content, latency.as_millis() as u64))
}

pub(crate) fn backoff_delay(base: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    let scaled = base.saturating_mul(factor);
    if scaled > max {
        max
    } else {
        scaled
    }
}
