//! Loads provider pool parameters from a JSON file colocated with the
//! binary, falling back to hardcoded defaults if the file is absent or
//! malformed. Mirrors `RateLimiter._load_configs_from_file`'s pattern of
//! applying a `safety_margin` to published rate-limit figures rather than
//! trusting them outright; here the margin is applied to the per-provider
//! concurrency bound instead of a token-bucket rate, since this pool's
//! admission gate is a semaphore plus priority queue, not a second bucket.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::types::ProviderRecord;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: GlobalSettings,
    providers: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct GlobalSettings {
    #[serde(default = "default_safety_margin")]
    safety_margin: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self { safety_margin: default_safety_margin() }
    }
}

fn default_safety_margin() -> f64 {
    0.8
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    name: String,
    endpoint: String,
    model: String,
    api_key_env: String,
    /// Published requests-per-minute ceiling; scaled by `safety_margin` and
    /// divided down into a concurrency bound, the same shape the original
    /// config file uses to turn an RPM figure into a token-bucket burst size.
    rpm: u32,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

/// Hardcoded fallback providers, used when no config file is present. These
/// intentionally carry no real credentials or endpoints — a deployment
/// without `llm_providers.json` has no usable pool, only a pool shape.
fn default_providers() -> Vec<ProviderEntry> {
    vec![
        ProviderEntry {
            name: "openai".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            rpm: 5000,
            weight: 1.0,
            priority: 0,
            timeout_secs: 30,
            enabled: true,
        },
        ProviderEntry {
            name: "openrouter".to_string(),
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.0-flash-lite-001".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            rpm: 20000,
            weight: 1.5,
            priority: 1,
            timeout_secs: 30,
            enabled: true,
        },
    ]
}

/// Concurrency bound derived from an RPM ceiling: same `rpm * margin / 20`
/// shape the original config loader uses for token-bucket burst sizing.
fn concurrency_from_rpm(rpm: u32, safety_margin: f64) -> usize {
    (((rpm as f64) * safety_margin / 20.0).floor() as usize).max(1)
}

/// Loads `llm_providers.json` at `path`; entries whose `api_key_env`
/// variable isn't set are skipped (logged at `warn`) rather than built
/// with an empty credential.
pub fn load_provider_configs(path: &Path) -> Vec<ProviderRecord> {
    let entries = match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<ConfigFile>(&raw) {
            Ok(parsed) => {
                info!(providers = parsed.providers.len(), path = %path.display(), "loaded LLM provider config");
                Some(parsed)
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "malformed LLM provider config, using defaults");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, path = %path.display(), "no LLM provider config found, using defaults");
            None
        }
    };

    let ConfigFile { config, providers } = entries.unwrap_or_else(|| ConfigFile {
        config: GlobalSettings::default(),
        providers: default_providers(),
    });

    providers
        .into_iter()
        .filter_map(|entry| {
            let Ok(api_key) = std::env::var(&entry.api_key_env) else {
                warn!(provider = %entry.name, env = %entry.api_key_env, "skipping provider: credential not set");
                return None;
            };
            let max_concurrent = concurrency_from_rpm(entry.rpm, config.safety_margin);
            debug!(provider = %entry.name, max_concurrent, "provider admitted to pool");
            Some(ProviderRecord {
                name: entry.name,
                endpoint: entry.endpoint,
                model: entry.model,
                api_key,
                max_concurrent,
                weight: entry.weight,
                priority: entry.priority,
                timeout: Duration::from_secs(entry.timeout_secs),
                enabled: entry.enabled,
            })
        })
        .filter(|p| p.enabled)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_scales_with_safety_margin() {
        assert_eq!(concurrency_from_rpm(5000, 0.8), 200);
        assert_eq!(concurrency_from_rpm(20000, 0.8), 800);
    }

    #[test]
    fn concurrency_never_rounds_down_to_zero() {
        assert_eq!(concurrency_from_rpm(1, 0.1), 1);
    }

    #[test]
    fn missing_file_falls_back_to_defaults_shape() {
        let providers = load_provider_configs(Path::new("/nonexistent/llm_providers.json"));
        // Defaults reference env vars that are very unlikely to be set in
        // a test environment, so the credential filter drops them all.
        assert!(providers.iter().all(|p| !p.api_key.is_empty()));
    }
}
