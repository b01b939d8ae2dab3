//! `ProviderPool`: the thing orchestration actually holds. Ties the
//! admission gate, health monitor, and selection policies together behind
//! `call` (single attempt against a named provider) and
//! `call_with_fallback` (the higher-level helper described in the spec's
//! "Retry with fallback" section).

use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::admission::ProviderAdmission;
use crate::client::{backoff_delay, call_provider};
use crate::config::load_provider_configs;
use crate::error::{FailureKind, LlmError, Result};
use crate::health::HealthMonitor;
use crate::selection::{self, fallback_order};
use crate::types::{CallOptions, CallResponse, ChatMessage, Priority, ProviderRecord};

const FALLBACK_MAX_ATTEMPTS_PER_PROVIDER: u32 = 2;
const FALLBACK_BASE_DELAY: Duration = Duration::from_millis(250);
const FALLBACK_MAX_DELAY: Duration = Duration::from_secs(5);

/// Registry of interchangeable LLM upstreams plus the shared admission
/// gate and health monitor that route calls across them.
pub struct ProviderPool {
    providers: Vec<ProviderRecord>,
    admission: ProviderAdmission,
    health: HealthMonitor,
    http: reqwest::Client,
    round_robin_cursor: AtomicUsize,
}

impl ProviderPool {
    pub fn new(providers: Vec<ProviderRecord>) -> Self {
        let admission = ProviderAdmission::new(providers.iter().map(|p| (p.name.clone(), p.max_concurrent)));
        Self {
            providers,
            admission,
            health: HealthMonitor::new(),
            http: reqwest::Client::new(),
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    /// Loads provider records from `llm_providers.json` colocated with the
    /// binary (see [`crate::config::load_provider_configs`]).
    pub fn from_config_file(path: &std::path::Path) -> Self {
        let providers = load_provider_configs(path);
        info!(providers = providers.len(), "LLM provider pool initialized");
        Self::new(providers)
    }

    pub fn providers(&self) -> &[ProviderRecord] {
        &self.providers
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    fn find(&self, name: &str) -> Option<&ProviderRecord> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Weighted pick among currently-healthy providers.
    pub fn select_weighted(&self) -> Option<&ProviderRecord> {
        selection::weighted(&self.providers, &self.health)
    }

    /// Highest-health pick among currently-healthy providers.
    pub fn select_best_health(&self) -> Option<&ProviderRecord> {
        selection::best_health(&self.providers, &self.health)
    }

    /// Round-robins over enabled providers regardless of health.
    pub fn select_round_robin(&self) -> Option<&ProviderRecord> {
        selection::round_robin(&self.providers, &self.round_robin_cursor)
    }

    /// One attempt against a named provider: admission gate, wire call,
    /// health bookkeeping. Does not retry or fall back.
    pub async fn call(
        &self,
        provider_name: &str,
        messages: &[ChatMessage],
        opts: CallOptions,
        priority: Priority,
    ) -> Result<CallResponse> {
        let provider = self
            .find(provider_name)
            .ok_or_else(|| LlmError::Config(format!("unknown provider '{provider_name}'")))?;

        let _permit = self.admission.acquire(&provider.name, priority).await;

        match call_provider(&self.http, provider, messages, &opts).await {
            Ok((content, latency_ms)) => {
                self.health.record_success(&provider.name, latency_ms);
                Ok(CallResponse { content, provider: provider.name.clone(), latency_ms })
            }
            Err(err) => {
                self.health.record_failure(&provider.name, err.kind(), 0);
                Err(err)
            }
        }
    }

    /// Tries up to [`FALLBACK_MAX_ATTEMPTS_PER_PROVIDER`] attempts per
    /// provider, with exponential backoff, falling through to the next
    /// provider in `fallback_order` on rate-limit, timeout, or generic
    /// error. A `BadRequest` halts all retries immediately, per spec
    /// §4.3's "bad-request errors stop all retries".
    pub async fn call_with_fallback(
        &self,
        messages: &[ChatMessage],
        opts: CallOptions,
        priority: Priority,
    ) -> Result<CallResponse> {
        let mut excluded = HashSet::new();
        let mut last_err: Option<LlmError> = None;

        loop {
            let order = fallback_order(&self.providers, &self.health, &excluded);
            let Some(provider) = order.first().copied() else {
                return Err(last_err.unwrap_or(LlmError::NoHealthyProvider));
            };

            for attempt in 0..FALLBACK_MAX_ATTEMPTS_PER_PROVIDER {
                match self.call(&provider.name, messages, opts.clone(), priority).await {
                    Ok(response) => return Ok(response),
                    Err(err) => {
                        if err.kind() == FailureKind::BadRequest {
                            return Err(err);
                        }
                        warn!(provider = %provider.name, attempt, error = %err, "LLM call failed, considering retry");
                        last_err = Some(err);
                        if attempt + 1 < FALLBACK_MAX_ATTEMPTS_PER_PROVIDER {
                            tokio::time::sleep(backoff_delay(FALLBACK_BASE_DELAY, attempt, FALLBACK_MAX_DELAY)).await;
                        }
                    }
                }
            }
            excluded.insert(provider.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(name: &str) -> ProviderRecord {
        ProviderRecord {
            name: name.to_string(),
            endpoint: "http://127.0.0.1:0".to_string(),
            model: "test".to_string(),
            api_key: "key".to_string(),
            max_concurrent: 4,
            weight: 1.0,
            priority: 0,
            timeout: Duration::from_millis(200),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn call_with_fallback_exhausts_all_providers_before_erroring() {
        let pool = ProviderPool::new(vec![provider("a"), provider("b")]);
        let messages = [ChatMessage::user("hi")];
        let result = pool.call_with_fallback(&messages, CallOptions::default(), Priority::Normal).await;
        assert!(result.is_err());
        // Both providers should have recorded a failure.
        assert!(pool.health().score("a") < 100);
        assert!(pool.health().score("b") < 100);
    }

    #[test]
    fn unknown_provider_name_is_a_config_error() {
        let pool = ProviderPool::new(vec![provider("a")]);
        assert!(pool.find("missing").is_none());
        let _ = pool;
    }
}
