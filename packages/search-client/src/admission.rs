//! Two-gate admission: a token bucket shapes request *rate*, a semaphore
//! bounds the *population* of in-flight HTTP requests. Splitting the two
//! is deliberate (see spec §4.2): a caller should queue on the bucket, not
//! on previous requests finishing.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Result, SearchError};

type Limiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct Admission {
    limiter: Arc<Limiter>,
    connections: Arc<Semaphore>,
    max_concurrent: usize,
    rate_limiter_timeout: Duration,
    connection_timeout: Duration,
}

/// RAII guard releasing the connection slot on drop; the rate-limiter
/// token is not releasable (tokens are spent, not held).
pub struct AdmissionGuard {
    _permit: OwnedSemaphorePermit,
}

impl Admission {
    pub fn new(
        rate_per_second: u32,
        max_burst: u32,
        max_concurrent: usize,
        rate_limiter_timeout: Duration,
        connection_timeout: Duration,
    ) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(rate_per_second.max(1)).expect("rate_per_second must be > 0"),
        )
        .allow_burst(NonZeroU32::new(max_burst.max(1)).expect("max_burst must be > 0"));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            connections: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            rate_limiter_timeout,
            connection_timeout,
        }
    }

    /// Acquire a rate-limit token, then a connection slot, each with its
    /// own acquisition timeout. `rate_timeout_override` lets retry
    /// attempts use the shorter `rate_limiter_retry_timeout`.
    pub async fn acquire(&self, rate_timeout_override: Option<Duration>) -> Result<AdmissionGuard> {
        let rate_timeout = rate_timeout_override.unwrap_or(self.rate_limiter_timeout);
        tokio::time::timeout(rate_timeout, self.limiter.until_ready())
            .await
            .map_err(|_| SearchError::RateLimitTimeout)?;

        let permit = tokio::time::timeout(
            self.connection_timeout,
            self.connections.clone().acquire_owned(),
        )
        .await
        .map_err(|_| SearchError::ConnectionTimeout)?
        .expect("semaphore never closed");

        Ok(AdmissionGuard { _permit: permit })
    }

    pub fn connections_in_use(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.connections.available_permits())
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_succeeds_under_quota() {
        let admission = Admission::new(10, 10, 2, Duration::from_secs(1), Duration::from_secs(1));
        let guard = admission.acquire(None).await.unwrap();
        assert_eq!(admission.connections_in_use(), 1);
        drop(guard);
        assert_eq!(admission.connections_in_use(), 0);
    }

    #[tokio::test]
    async fn connection_slot_exhausted_times_out() {
        let admission = Admission::new(100, 100, 1, Duration::from_secs(1), Duration::from_millis(50));
        let first = admission.acquire(None).await.unwrap();
        let err = admission.acquire(None).await.unwrap_err();
        assert!(matches!(err, SearchError::ConnectionTimeout));
        drop(first);
    }

    #[tokio::test]
    async fn rate_limit_exhausted_times_out() {
        let admission = Admission::new(1, 1, 10, Duration::from_millis(50), Duration::from_secs(1));
        admission.acquire(None).await.unwrap();
        let err = admission.acquire(None).await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimitTimeout));
    }

    #[tokio::test]
    async fn retry_override_uses_shorter_timeout() {
        let admission = Admission::new(1, 1, 10, Duration::from_secs(5), Duration::from_secs(1));
        admission.acquire(None).await.unwrap();
        let started = std::time::Instant::now();
        let err = admission
            .acquire(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RateLimitTimeout));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
