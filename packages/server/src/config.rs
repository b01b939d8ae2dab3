//! Process configuration loaded from the environment at startup.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Configuration shared by the ingress binary and the worker binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_pool_min: u32,
    pub db_pool_max: u32,

    pub serper_api_key: Option<String>,
    pub serper_base_url: String,

    /// Path to the LLM provider pool's JSON config file, colocated with
    /// the binary. Missing/malformed falls back to hardcoded defaults
    /// (see `llm_pool::config::load_provider_configs`).
    pub llm_providers_config: PathBuf,

    /// Optional bearer token ingress handlers require on every request.
    /// `None` disables auth (local/dev).
    pub api_access_token: Option<String>,

    /// Optional OTLP/Phoenix collector endpoint for tracing export.
    pub phoenix_collector_url: Option<String>,

    pub port: u16,

    /// Interval between empty-claim sleeps in the worker's claim loop.
    pub worker_poll_interval_secs: u64,
    /// Stale-lock recovery sweep cadence.
    pub recovery_sweep_interval_secs: u64,
    /// How long a `processing` row may hold its lock before the sweep
    /// resets it back to `queued`.
    pub recovery_grace_period_secs: i64,
}

impl Config {
    /// Load configuration from environment variables, loading a `.env`
    /// file first if present (development convenience only).
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_pool_min: env_or("DB_POOL_MIN", 5)?,
            db_pool_max: env_or("DB_POOL_MAX", 20)?,

            serper_api_key: env::var("SERPER_API_KEY").ok(),
            serper_base_url: env::var("SERPER_BASE_URL")
                .unwrap_or_else(|_| "https://google.serper.dev".to_string()),

            llm_providers_config: env::var("LLM_PROVIDERS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("llm_providers.json")),

            api_access_token: env::var("API_ACCESS_TOKEN").ok(),
            phoenix_collector_url: env::var("PHOENIX_COLLECTOR_URL").ok(),

            port: env_or("PORT", 8080)?,

            worker_poll_interval_secs: env_or("WORKER_POLL_INTERVAL_SECS", 2)?,
            recovery_sweep_interval_secs: env_or("RECOVERY_SWEEP_INTERVAL_SECS", 60)?,
            recovery_grace_period_secs: env_or("RECOVERY_GRACE_PERIOD_SECS", 600)?,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| anyhow::anyhow!("{key} is not valid: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default_when_unset() {
        // SAFETY-ish: a key that will not collide with real env in test runs.
        let v: u32 = env_or("SERVER_TEST_DOES_NOT_EXIST_XYZ", 42).unwrap();
        assert_eq!(v, 42);
    }
}
