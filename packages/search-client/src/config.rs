//! Tunables for [`crate::SearchClient`].
//!
//! Defaults mirror the Serpshot-backed original: 190 requests/second
//! sustained, burst of 200, up to 1000 simultaneous connections.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    pub rate_per_second: u32,
    pub max_burst: u32,
    pub max_concurrent: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub retry_after_max: Duration,
    pub retry_jitter: Duration,
    pub rate_limiter_timeout: Duration,
    pub rate_limiter_retry_timeout: Duration,
    pub connection_semaphore_timeout: Duration,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            rate_per_second: 190,
            max_burst: 200,
            max_concurrent: 1000,
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(10),
            retry_after_max: Duration::from_secs(60),
            retry_jitter: Duration::from_secs(2),
            rate_limiter_timeout: Duration::from_secs(10),
            rate_limiter_retry_timeout: Duration::from_secs(5),
            connection_semaphore_timeout: Duration::from_secs(10),
            api_key: None,
            base_url: "https://api.serpshot.com".to_string(),
        }
    }
}
