//! Health scoring over a rolling window of recent outcomes per provider.
//!
//! The score and its weights are a direct port of the original LLM health
//! monitor: four weighted sub-scores (success rate, latency, rate-limit
//! pressure, recency-of-last-failure) collapsed into a single 0-100 value.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use crate::error::FailureKind;

const SUCCESS_RATE_WEIGHT: f64 = 0.40;
const LATENCY_WEIGHT: f64 = 0.30;
const RATE_LIMIT_WEIGHT: f64 = 0.20;
const RECENCY_WEIGHT: f64 = 0.10;

const UNHEALTHY_THRESHOLD: i32 = 30;
const DEGRADED_THRESHOLD: i32 = 60;
const LATENCY_IDEAL_MS: f64 = 2000.0;
const LATENCY_MAX_MS: f64 = 30000.0;
const RECENT_LATENCIES_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Default)]
struct Metrics {
    requests_total: u64,
    requests_success: u64,
    rate_limits_hit: u64,
    timeouts: u64,
    errors: u64,
    recent_latencies: VecDeque<u64>,
    last_failure: Option<Instant>,
    score: i32,
}

impl Metrics {
    fn success_rate(&self) -> f64 {
        if self.requests_total == 0 {
            1.0
        } else {
            self.requests_success as f64 / self.requests_total as f64
        }
    }

    fn avg_latency_ms(&self) -> f64 {
        if self.recent_latencies.is_empty() {
            0.0
        } else {
            self.recent_latencies.iter().sum::<u64>() as f64 / self.recent_latencies.len() as f64
        }
    }

    fn push_latency(&mut self, latency_ms: u64) {
        if self.recent_latencies.len() == RECENT_LATENCIES_CAP {
            self.recent_latencies.pop_front();
        }
        self.recent_latencies.push_back(latency_ms);
    }
}

fn calculate_score(m: &Metrics) -> i32 {
    let success_score = m.success_rate() * 100.0;

    let avg_latency = m.avg_latency_ms();
    let latency_score = if avg_latency <= LATENCY_IDEAL_MS {
        100.0
    } else if avg_latency >= LATENCY_MAX_MS {
        0.0
    } else {
        let ratio = (avg_latency - LATENCY_IDEAL_MS) / (LATENCY_MAX_MS - LATENCY_IDEAL_MS);
        100.0 * (1.0 - ratio)
    };

    let rate_limit_score = if m.requests_total == 0 {
        100.0
    } else {
        let ratio = m.rate_limits_hit as f64 / m.requests_total as f64;
        100.0 * (1.0 - (ratio * 5.0).min(1.0))
    };

    let recency_score = match m.last_failure {
        None => 100.0,
        Some(t) => {
            let since = t.elapsed().as_secs_f64();
            if since < 10.0 {
                30.0
            } else if since < 60.0 {
                60.0
            } else if since < 300.0 {
                80.0
            } else {
                100.0
            }
        }
    };

    let final_score = success_score * SUCCESS_RATE_WEIGHT
        + latency_score * LATENCY_WEIGHT
        + rate_limit_score * RATE_LIMIT_WEIGHT
        + recency_score * RECENCY_WEIGHT;

    (final_score as i32).clamp(0, 100)
}

/// Tracks per-provider metrics and derives health scores from them.
pub struct HealthMonitor {
    metrics: Mutex<std::collections::HashMap<String, Metrics>>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self { metrics: Mutex::new(std::collections::HashMap::new()) }
    }
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, provider: &str, latency_ms: u64) {
        let mut metrics = self.metrics.lock().expect("health monitor mutex poisoned");
        let m = metrics.entry(provider.to_string()).or_default();
        m.requests_total += 1;
        m.requests_success += 1;
        m.push_latency(latency_ms);
        m.score = calculate_score(m);
    }

    pub fn record_failure(&self, provider: &str, kind: FailureKind, latency_ms: u64) {
        let mut metrics = self.metrics.lock().expect("health monitor mutex poisoned");
        let m = metrics.entry(provider.to_string()).or_default();
        m.requests_total += 1;
        m.last_failure = Some(Instant::now());
        if latency_ms > 0 {
            m.push_latency(latency_ms);
        }
        match kind {
            FailureKind::Timeout => m.timeouts += 1,
            FailureKind::RateLimit => m.rate_limits_hit += 1,
            FailureKind::BadRequest | FailureKind::Generic => m.errors += 1,
        }
        m.score = calculate_score(m);
    }

    pub fn score(&self, provider: &str) -> i32 {
        self.metrics
            .lock()
            .expect("health monitor mutex poisoned")
            .get(provider)
            .map(|m| m.score)
            .unwrap_or(100)
    }

    pub fn status(&self, provider: &str) -> Status {
        let score = self.score(provider);
        if score > DEGRADED_THRESHOLD {
            Status::Healthy
        } else if score > UNHEALTHY_THRESHOLD {
            Status::Degraded
        } else {
            Status::Unhealthy
        }
    }

    pub fn is_healthy(&self, provider: &str) -> bool {
        self.score(provider) > UNHEALTHY_THRESHOLD
    }

    /// Healthy providers among `candidates`, best score first.
    pub fn healthy_ranked<'a>(&self, candidates: &[&'a str]) -> Vec<&'a str> {
        let mut healthy: Vec<&str> =
            candidates.iter().copied().filter(|p| self.is_healthy(p)).collect();
        healthy.sort_by_key(|p| std::cmp::Reverse(self.score(p)));
        healthy
    }

    pub fn reset(&self, provider: &str) {
        self.metrics.lock().expect("health monitor mutex poisoned").remove(provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_provider_starts_fully_healthy() {
        let hm = HealthMonitor::new();
        assert_eq!(hm.score("p"), 100);
        assert_eq!(hm.status("p"), Status::Healthy);
    }

    #[test]
    fn repeated_equal_latency_successes_never_decrease_score() {
        let hm = HealthMonitor::new();
        let mut last = hm.score("p");
        for _ in 0..10 {
            hm.record_success("p", 500);
            let next = hm.score("p");
            assert!(next >= last, "score regressed: {next} < {last}");
            last = next;
        }
    }

    #[test]
    fn rate_limits_depress_score_faster_than_generic_errors() {
        let rl = HealthMonitor::new();
        let generic = HealthMonitor::new();
        for _ in 0..5 {
            rl.record_failure("p", FailureKind::RateLimit, 100);
            generic.record_failure("p", FailureKind::Generic, 100);
        }
        // Both degrade success_rate identically; rate-limit failures also
        // depress the rate-limit sub-score, so rl's total should not exceed
        // generic's.
        assert!(rl.score("p") <= generic.score("p"));
    }

    #[test]
    fn unhealthy_threshold_excludes_from_healthy_set() {
        let hm = HealthMonitor::new();
        for _ in 0..50 {
            hm.record_failure("bad", FailureKind::Generic, 100);
        }
        hm.record_success("good", 100);
        let ranked = hm.healthy_ranked(&["bad", "good"]);
        assert_eq!(ranked, vec!["good"]);
    }
}
