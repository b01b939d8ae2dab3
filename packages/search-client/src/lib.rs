//! Pooled, rate-limited SERP search client.
//!
//! Wraps a provider's batch search endpoint behind a two-gate admission
//! control (token bucket + connection semaphore, see [`admission`]), an
//! in-process result cache, retry/backoff with `Retry-After` support, and an
//! optional batching facade for call-sites that only need one query at a
//! time ([`batch_aggregator`]).

mod admission;
mod batch_aggregator;
mod cache;
mod client;
mod config;
mod error;
mod metrics;
mod retry;
mod types;

pub use batch_aggregator::{spawn as spawn_batch_aggregator, BatchAggregatorHandle};
pub use client::SearchClient;
pub use config::SearchClientConfig;
pub use error::{Result, SearchError};
pub use metrics::SearchMetricsSnapshot;
pub use types::{BatchOutcome, SearchOutcome, SearchRow};
