//! Provider selection policies: weighted, best-health, round-robin, and
//! the exclude-set ordering `call_with_fallback` builds its attempt list
//! from.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::health::HealthMonitor;
use crate::types::ProviderRecord;

/// Proportional-to-weight pick among healthy providers.
pub fn weighted<'a>(providers: &'a [ProviderRecord], health: &HealthMonitor) -> Option<&'a ProviderRecord> {
    let healthy: Vec<&ProviderRecord> =
        providers.iter().filter(|p| p.enabled && health.is_healthy(&p.name)).collect();
    if healthy.is_empty() {
        return None;
    }
    let total_weight: f64 = healthy.iter().map(|p| p.weight).sum();
    if total_weight <= 0.0 {
        return healthy.first().copied();
    }
    let mut roll = rand::thread_rng().gen_range(0.0..total_weight);
    for p in &healthy {
        if roll < p.weight {
            return Some(p);
        }
        roll -= p.weight;
    }
    healthy.last().copied()
}

/// Highest health score among healthy providers.
pub fn best_health<'a>(providers: &'a [ProviderRecord], health: &HealthMonitor) -> Option<&'a ProviderRecord> {
    providers
        .iter()
        .filter(|p| p.enabled && health.is_healthy(&p.name))
        .max_by_key(|p| health.score(&p.name))
}

/// Round-robins over enabled providers regardless of health; callers that
/// want health-awareness should pair this with an exclude-set of unhealthy
/// names.
pub fn round_robin<'a>(providers: &'a [ProviderRecord], cursor: &AtomicUsize) -> Option<&'a ProviderRecord> {
    let enabled: Vec<&ProviderRecord> = providers.iter().filter(|p| p.enabled).collect();
    if enabled.is_empty() {
        return None;
    }
    let idx = cursor.fetch_add(1, Ordering::Relaxed) % enabled.len();
    Some(enabled[idx])
}

/// Builds the fallback attempt order: a weighted pick first, then every
/// other enabled, non-excluded provider ordered by descending weight.
pub fn fallback_order<'a>(
    providers: &'a [ProviderRecord],
    health: &HealthMonitor,
    exclude: &HashSet<String>,
) -> Vec<&'a ProviderRecord> {
    let candidates: Vec<&ProviderRecord> =
        providers.iter().filter(|p| p.enabled && !exclude.contains(&p.name)).collect();

    let first = weighted(&candidates.iter().map(|p| (*p).clone()).collect::<Vec<_>>(), health)
        .and_then(|picked| candidates.iter().find(|p| p.name == picked.name).copied());

    let mut ordered = Vec::with_capacity(candidates.len());
    if let Some(first) = first {
        ordered.push(first);
    }
    let mut rest: Vec<&ProviderRecord> =
        candidates.into_iter().filter(|p| Some(p.name.as_str()) != ordered.first().map(|f| f.name.as_str())).collect();
    rest.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
    ordered.extend(rest);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(name: &str, weight: f64) -> ProviderRecord {
        ProviderRecord {
            name: name.to_string(),
            endpoint: "https://example.invalid".to_string(),
            model: "test-model".to_string(),
            api_key: "key".to_string(),
            max_concurrent: 10,
            weight,
            priority: 0,
            timeout: Duration::from_secs(5),
            enabled: true,
        }
    }

    #[test]
    fn weighted_pick_favors_higher_weight_over_many_trials() {
        let providers = vec![provider("a", 1.0), provider("b", 9.0)];
        let health = HealthMonitor::new();
        let mut counts = std::collections::HashMap::new();
        for _ in 0..500 {
            let picked = weighted(&providers, &health).unwrap();
            *counts.entry(picked.name.clone()).or_insert(0) += 1;
        }
        assert!(counts["b"] > counts["a"]);
    }

    #[test]
    fn unhealthy_provider_never_selected() {
        let providers = vec![provider("a", 1.0)];
        let health = HealthMonitor::new();
        for _ in 0..50 {
            health.record_failure("a", crate::error::FailureKind::Generic, 100);
        }
        assert!(weighted(&providers, &health).is_none());
        assert!(best_health(&providers, &health).is_none());
    }

    #[test]
    fn round_robin_cycles_through_all_providers() {
        let providers = vec![provider("a", 1.0), provider("b", 1.0), provider("c", 1.0)];
        let cursor = AtomicUsize::new(0);
        let picks: Vec<&str> = (0..6).map(|_| round_robin(&providers, &cursor).unwrap().name.as_str()).collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn fallback_order_excludes_named_providers() {
        let providers = vec![provider("a", 1.0), provider("b", 1.0)];
        let health = HealthMonitor::new();
        let mut exclude = HashSet::new();
        exclude.insert("a".to_string());
        let order = fallback_order(&providers, &health, &exclude);
        assert!(order.iter().all(|p| p.name != "a"));
    }
}
