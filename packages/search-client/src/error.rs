//! Error taxonomy for the search client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can surface from a single `search`/`search_batch` call.
///
/// These are fast-failures: a capacity gate timed out, or no API key is
/// configured. Transient provider errors (5xx, connection failures, 4xx)
/// are retried internally and, if retries are exhausted, reported instead
/// as a successful [`crate::SearchOutcome`]/[`crate::BatchOutcome`] with
/// `total_failure: true` — that path is a soft failure the orchestration
/// layer handles by persisting an empty marker artifact, not a hard error.
#[derive(Debug, Clone, Copy, Error)]
pub enum SearchError {
    #[error("rate limiter timed out waiting for a token")]
    RateLimitTimeout,

    #[error("timed out waiting for a connection slot")]
    ConnectionTimeout,

    #[error("provider key not configured")]
    MissingCredential,
}
