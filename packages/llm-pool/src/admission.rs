//! Priority admission gate: `HIGH` calls never wait behind `NORMAL` ones.
//!
//! A pool-wide waiting-HIGH counter gates entry to each provider's
//! concurrency semaphore. While the counter is non-zero, `NORMAL` callers
//! back off on a short sleep before even attempting to acquire a permit;
//! `HIGH` callers bump the counter and go straight for a permit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::types::Priority;

const NORMAL_BACKOFF: Duration = Duration::from_millis(50);

pub struct ProviderAdmission {
    semaphores: HashMap<String, Arc<Semaphore>>,
    waiting_high: Arc<AtomicU64>,
}

pub struct CallPermit {
    _permit: OwnedSemaphorePermit,
}

impl ProviderAdmission {
    pub fn new(capacities: impl IntoIterator<Item = (String, usize)>) -> Self {
        let semaphores = capacities
            .into_iter()
            .map(|(name, cap)| (name, Arc::new(Semaphore::new(cap.max(1)))))
            .collect();
        Self { semaphores, waiting_high: Arc::new(AtomicU64::new(0)) }
    }

    pub async fn acquire(&self, provider: &str, priority: Priority) -> CallPermit {
        let semaphore = self
            .semaphores
            .get(provider)
            .expect("acquire called for a provider outside the pool's record set")
            .clone();

        match priority {
            Priority::High => {
                self.waiting_high.fetch_add(1, Ordering::SeqCst);
                let permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                self.waiting_high.fetch_sub(1, Ordering::SeqCst);
                CallPermit { _permit: permit }
            }
            Priority::Normal => {
                while self.waiting_high.load(Ordering::SeqCst) > 0 {
                    tokio::time::sleep(NORMAL_BACKOFF).await;
                }
                let permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                CallPermit { _permit: permit }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn high_priority_never_waits_behind_normal() {
        let admission = Arc::new(ProviderAdmission::new([("p".to_string(), 1)]));

        // Take the only permit so both callers below must wait.
        let held = admission.acquire("p", Priority::Normal).await;

        let admission_high = admission.clone();
        let high_started = Instant::now();
        let high = tokio::spawn(async move {
            admission_high.acquire("p", Priority::High).await;
            high_started.elapsed()
        });

        // Give the HIGH call time to register as waiting.
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);

        let elapsed = high.await.unwrap();
        assert!(elapsed < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn normal_backs_off_while_high_is_waiting() {
        let admission = Arc::new(ProviderAdmission::new([("p".to_string(), 1)]));
        let held = admission.acquire("p", Priority::Normal).await;

        let admission_high = admission.clone();
        tokio::spawn(async move {
            admission_high.acquire("p", Priority::High).await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let admission_normal = admission.clone();
        let started = Instant::now();
        let normal = tokio::spawn(async move {
            admission_normal.acquire("p", Priority::Normal).await;
            started.elapsed()
        });

        // The NORMAL call should still be backing off, not holding the permit.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!normal.is_finished());
        drop(held);
    }
}
