//! Error taxonomy for the LLM provider pool.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// How a failed call should influence retry/fallback and health scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimit,
    Timeout,
    BadRequest,
    Generic,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("priority admission timed out")]
    AdmissionTimeout,

    #[error("no healthy provider available")]
    NoHealthyProvider,

    #[error("provider {provider} rate limited: {message}")]
    RateLimit { provider: String, message: String },

    #[error("provider {provider} timed out")]
    Timeout { provider: String },

    #[error("provider {provider} rejected the request: {message}")]
    BadRequest { provider: String, message: String },

    #[error("provider {provider} error: {message}")]
    Generic { provider: String, message: String },

    #[error("provider {provider} returned no content")]
    EmptyResponse { provider: String },

    #[error("provider configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Classifies a failure the way `HealthMonitor::record_failure` and the
    /// fallback retry loop both need to: `BadRequest` halts retries
    /// entirely, the rest fall through to the next provider.
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::RateLimit { .. } => FailureKind::RateLimit,
            LlmError::Timeout { .. } => FailureKind::Timeout,
            LlmError::BadRequest { .. } => FailureKind::BadRequest,
            _ => FailureKind::Generic,
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            LlmError::RateLimit { provider, .. }
            | LlmError::Timeout { provider }
            | LlmError::BadRequest { provider, .. }
            | LlmError::Generic { provider, .. }
            | LlmError::EmptyResponse { provider } => Some(provider),
            _ => None,
        }
    }
}
