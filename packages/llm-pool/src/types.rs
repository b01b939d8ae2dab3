//! Provider records and wire-adjacent call types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One interchangeable upstream provider.
#[derive(Debug, Clone)]
pub struct ProviderRecord {
    pub name: String,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub max_concurrent: usize,
    pub weight: f64,
    /// Tie-break ordering among providers of equal weight/health; lower
    /// sorts first. Distinct from a call's [`Priority`].
    pub priority: i32,
    pub timeout: Duration,
    pub enabled: bool,
}

/// Per-call urgency, gating admission ahead of the per-provider semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Per-call overrides; fields left `None` fall back to the provider record.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
    pub temperature: Option<f32>,
    pub response_format_json: bool,
}

/// Outcome of a successful call.
#[derive(Debug, Clone)]
pub struct CallResponse {
    pub content: String,
    pub provider: String,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "response_format")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: String,
}
