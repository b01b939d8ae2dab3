//! The pooled, rate-limited SERP search client.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::admission::Admission;
use crate::cache::SearchCache;
use crate::config::SearchClientConfig;
use crate::error::Result;
use crate::metrics::{SearchMetrics, SearchMetricsSnapshot};
use crate::retry::{exponential_backoff, parse_retry_after, with_jitter};
use crate::types::{
    parse_batch, parse_single, BatchOutcome, ProviderEnvelope, ProviderRequest, SearchOutcome,
    SearchRow,
};

pub struct SearchClient {
    http: reqwest::Client,
    admission: Admission,
    cache: SearchCache,
    metrics: SearchMetrics,
    config: SearchClientConfig,
}

/// What a single HTTP attempt resolved to, before rows are fanned back out
/// to single-query or batch callers.
enum Attempt {
    Ok(Vec<Vec<SearchRow>>),
    RateLimited(Option<Duration>),
    Permanent,
    Retryable,
}

impl SearchClient {
    pub fn new(config: SearchClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(100)
            .build()
            .expect("building reqwest client with static config never fails");

        let admission = Admission::new(
            config.rate_per_second,
            config.max_burst,
            config.max_concurrent,
            config.rate_limiter_timeout,
            config.connection_semaphore_timeout,
        );

        info!(
            rate = config.rate_per_second,
            burst = config.max_burst,
            max_concurrent = config.max_concurrent,
            "search client initialized"
        );

        Self {
            http,
            admission,
            cache: SearchCache::new(),
            metrics: SearchMetrics::default(),
            config,
        }
    }

    pub fn metrics(&self) -> SearchMetricsSnapshot {
        self.metrics.snapshot(
            self.admission.connections_in_use(),
            self.admission.max_concurrent(),
        )
    }

    /// Single-query search. A cache hit short-circuits both admission gates.
    pub async fn search(&self, query: &str, num_results: u32) -> Result<SearchOutcome> {
        if let Some(rows) = self.cache.get(query, num_results) {
            debug!(query, "search cache hit");
            return Ok(SearchOutcome {
                rows,
                retries_consumed: 0,
                total_failure: false,
            });
        }

        let Some(api_key) = self.config.api_key.clone() else {
            warn!("search client has no API key configured");
            return Err(crate::error::SearchError::MissingCredential);
        };

        let guard = self.admission.acquire(None).await.map_err(|e| {
            error!(query, "search admission failed: {e}");
            e
        })?;

        let queries = vec![query.to_string()];
        let (mut rows_per_query, retries_consumed, total_failure) =
            self.run_with_retry(&api_key, &queries, num_results).await;
        drop(guard);

        let rows = rows_per_query.pop().unwrap_or_default();
        if !total_failure {
            self.cache.put(query, num_results, rows.clone());
        }
        Ok(SearchOutcome {
            rows,
            retries_consumed,
            total_failure,
        })
    }

    /// Batched search, up to 100 queries per provider request. Cached
    /// queries among the batch are served without a network round-trip;
    /// only the remainder are sent (and only the remainder are cached on
    /// success).
    pub async fn search_batch(&self, queries: &[String], num_results: u32) -> Result<BatchOutcome> {
        if queries.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let truncated: Vec<String> = queries.iter().take(100).cloned().collect();
        if queries.len() > 100 {
            warn!(requested = queries.len(), "truncating batch to provider cap of 100");
        }

        let mut rows_per_query = vec![Vec::new(); truncated.len()];
        let mut to_fetch = Vec::new();
        let mut to_fetch_idx = Vec::new();
        for (i, q) in truncated.iter().enumerate() {
            if let Some(cached) = self.cache.get(q, num_results) {
                rows_per_query[i] = cached;
            } else {
                to_fetch.push(q.clone());
                to_fetch_idx.push(i);
            }
        }

        if to_fetch.is_empty() {
            return Ok(BatchOutcome {
                rows_per_query,
                retries_consumed: 0,
                total_failure: false,
            });
        }

        let Some(api_key) = self.config.api_key.clone() else {
            warn!("search client has no API key configured");
            return Err(crate::error::SearchError::MissingCredential);
        };

        let guard = self.admission.acquire(None).await.map_err(|e| {
            error!("batch search admission failed: {e}");
            e
        })?;

        let (fetched, retries_consumed, total_failure) =
            self.run_with_retry(&api_key, &to_fetch, num_results).await;
        drop(guard);

        for (slot, rows) in to_fetch_idx.into_iter().zip(fetched.into_iter()) {
            if !total_failure {
                self.cache.put(&truncated[slot], num_results, rows.clone());
            }
            rows_per_query[slot] = rows;
        }

        Ok(BatchOutcome {
            rows_per_query,
            retries_consumed,
            total_failure,
        })
    }

    /// Shared retry loop for both the single-query and batch paths (the
    /// provider treats a 1-element `queries` array identically to the
    /// single-query endpoint).
    async fn run_with_retry(
        &self,
        api_key: &str,
        queries: &[String],
        num_results: u32,
    ) -> (Vec<Vec<SearchRow>>, u32, bool) {
        let mut last_retry_after = None;
        let mut retries_consumed = 0;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                retries_consumed += 1;
                let delay = self.compute_delay(attempt, last_retry_after.take());
                let src = if last_retry_after.is_some() { "retry-after" } else { "backoff" };
                warn!(attempt, ?delay, src, "serp retry");
                tokio::time::sleep(delay).await;

                if self
                    .admission
                    .acquire(Some(self.config.rate_limiter_retry_timeout))
                    .await
                    .is_err()
                {
                    warn!("rate limit timeout on retry");
                    continue;
                }
            }

            self.metrics.record_attempt();
            let started = Instant::now();
            let resp = self
                .http
                .post(format!("{}/api/search/google", self.config.base_url))
                .header("X-API-Key", api_key)
                .json(&ProviderRequest {
                    queries,
                    kind: "search",
                    num: 30.min(num_results),
                    page: 1,
                    location: "BR".to_string(),
                    lr: "pt-BR".to_string(),
                    gl: "br".to_string(),
                    hl: "pt-BR".to_string(),
                })
                .send()
                .await;
            let latency = started.elapsed();

            match self.classify(resp, queries.len()).await {
                Attempt::Ok(rows) => {
                    self.metrics.record_success(latency);
                    info!(count = rows.len(), latency_ms = latency.as_millis() as u64, "serp search ok");
                    return (rows, retries_consumed, false);
                }
                Attempt::Permanent => {
                    self.metrics.record_failure();
                    error!("serp client error, not retrying");
                    return (vec![Vec::new(); queries.len()], retries_consumed, true);
                }
                Attempt::RateLimited(parsed) => {
                    self.metrics.record_rate_limited();
                    last_retry_after = parsed;
                }
                Attempt::Retryable => {}
            }
        }

        self.metrics.record_failure();
        error!(attempts = self.config.max_retries, "serp exhausted retries");
        (vec![Vec::new(); queries.len()], retries_consumed, true)
    }

    fn compute_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let base = retry_after.unwrap_or_else(|| {
            exponential_backoff(self.config.retry_base_delay, attempt, self.config.retry_max_delay)
        });
        with_jitter(base, self.config.retry_jitter)
    }

    async fn classify(
        &self,
        resp: std::result::Result<reqwest::Response, reqwest::Error>,
        expected: usize,
    ) -> Attempt {
        let resp = match resp {
            Ok(r) => r,
            Err(_) => return Attempt::Retryable,
        };

        let status = resp.status();
        log_rate_limit_headers(&resp);

        if status.as_u16() == 429 {
            let header = resp
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let parsed = parse_retry_after(header.as_deref(), self.config.retry_after_max);
            return Attempt::RateLimited(parsed);
        }
        if status.as_u16() >= 500 {
            return Attempt::Retryable;
        }
        if status.as_u16() >= 400 {
            return Attempt::Permanent;
        }

        match resp.json::<ProviderEnvelope>().await {
            Ok(envelope) if expected == 1 => Attempt::Ok(vec![parse_single(envelope.data)]),
            Ok(envelope) => Attempt::Ok(parse_batch(envelope.data, expected)),
            Err(_) => Attempt::Retryable,
        }
    }
}

fn log_rate_limit_headers(resp: &reqwest::Response) {
    let limit = resp.headers().get("X-RateLimit-Limit");
    let remaining = resp.headers().get("X-RateLimit-Remaining");
    let reset = resp.headers().get("X-RateLimit-Reset");
    if limit.is_some() || remaining.is_some() || reset.is_some() {
        debug!(?limit, ?remaining, ?reset, "serp rate-limit headers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(base_url: String) -> SearchClientConfig {
        SearchClientConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(10),
            retry_max_delay: Duration::from_millis(50),
            retry_jitter: Duration::from_millis(5),
            rate_limiter_timeout: Duration::from_secs(2),
            rate_limiter_retry_timeout: Duration::from_secs(2),
            connection_semaphore_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_api_key_fails_fast() {
        let client = SearchClient::new(SearchClientConfig::default());
        let err = client.search("query", 10).await.unwrap_err();
        assert!(matches!(err, crate::error::SearchError::MissingCredential));
    }

    #[tokio::test]
    async fn successful_single_search_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search/google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "results": [{"title": "A", "link": "https://a", "snippet": "s"}] }
            })))
            .mount(&server)
            .await;

        let client = SearchClient::new(config_for(server.uri()));
        let outcome = client.search("query", 10).await.unwrap();
        assert!(!outcome.total_failure);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].title, "A");
    }

    #[tokio::test]
    async fn cache_hit_skips_network_entirely() {
        // No mock registered; a request would fail loudly if one were made.
        let server = MockServer::start().await;
        let client = SearchClient::new(config_for(server.uri()));
        client.cache.put(
            "cached",
            10,
            vec![SearchRow {
                title: "cached".into(),
                link: "https://cached".into(),
                snippet: "s".into(),
            }],
        );
        let outcome = client.search("cached", 10).await.unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.retries_consumed, 0);
    }

    #[tokio::test]
    async fn permanent_client_error_sets_total_failure_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search/google"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(config_for(server.uri()));
        let outcome = client.search("query", 10).await.unwrap();
        assert!(outcome.total_failure);
        assert!(outcome.rows.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_retried_then_exhausts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search/google"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = SearchClient::new(config_for(server.uri()));
        let outcome = client.search("query", 10).await.unwrap();
        assert!(outcome.total_failure);
        assert_eq!(outcome.retries_consumed, 1);
    }

    #[tokio::test]
    async fn batch_search_splits_rows_per_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search/google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "results": [{"title": "A", "link": "https://a", "snippet": "s"}] },
                    { "results": [{"title": "B", "link": "https://b", "snippet": "s"}] }
                ]
            })))
            .mount(&server)
            .await;

        let client = SearchClient::new(config_for(server.uri()));
        let queries = vec!["q1".to_string(), "q2".to_string()];
        let outcome = client.search_batch(&queries, 10).await.unwrap();
        assert!(!outcome.total_failure);
        assert_eq!(outcome.rows_per_query.len(), 2);
        assert_eq!(outcome.rows_per_query[0][0].title, "A");
        assert_eq!(outcome.rows_per_query[1][0].title, "B");
    }
}
