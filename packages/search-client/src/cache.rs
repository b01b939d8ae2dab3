//! Per-process, in-memory cache keyed by `(query, num_results)`.
//!
//! Advisory only: if multiple ingress processes run, divergence between
//! their caches is tolerable (§5, "shared resources").

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::SearchRow;

#[derive(Default)]
pub struct SearchCache {
    entries: Mutex<HashMap<(String, u32), Vec<SearchRow>>>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str, num_results: u32) -> Option<Vec<SearchRow>> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .get(&(query.to_string(), num_results))
            .cloned()
    }

    pub fn put(&self, query: &str, num_results: u32, rows: Vec<SearchRow>) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert((query.to_string(), num_results), rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit_after_put() {
        let cache = SearchCache::new();
        assert!(cache.get("q", 10).is_none());
        cache.put("q", 10, vec![]);
        assert!(cache.get("q", 10).is_some());
    }

    #[test]
    fn distinct_num_results_are_distinct_keys() {
        let cache = SearchCache::new();
        cache.put("q", 10, vec![SearchRow {
            title: "a".into(),
            link: "b".into(),
            snippet: "c".into(),
        }]);
        assert!(cache.get("q", 30).is_none());
    }
}
