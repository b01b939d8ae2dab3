//! The durable job queue shared by the discovery and profile stages.
//!
//! One Postgres table per queue (`queue_discovery`, `queue_profile`), same
//! schema, same claim/ack/fail protocol (see spec §4.1). [`Queue`] is
//! parameterized over a table name rather than generic over a job type —
//! both tables store nothing but a `company_id`.

mod postgres;
pub mod recovery;

pub use postgres::PostgresQueue;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::JobRecord;

/// A claimed `(job_id, company_id)` pair, ready for a stage runner.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job_id: i64,
    pub company_id: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueMetrics {
    pub queued: i64,
    pub processing: i64,
    pub failed: i64,
    pub oldest_queued_age_seconds: Option<f64>,
}

/// Queue operations over one logical queue (one table). See spec §4.1.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Returns `true` iff a new job row was created for `company_id`. A
    /// concurrent duplicate insertion is caught as a unique-constraint
    /// violation, not pre-checked — this is invariant U1's defining
    /// correctness property (spec §8 property 13).
    async fn enqueue(&self, company_id: &str) -> anyhow::Result<bool>;

    /// Atomically claims up to `limit` `queued` rows whose `available_at`
    /// has passed, skipping rows already locked by a concurrent claimant.
    async fn claim(&self, worker_id: &str, limit: i64) -> anyhow::Result<Vec<ClaimedJob>>;

    async fn ack(&self, job_id: i64) -> anyhow::Result<()>;

    /// Increments the attempt count; transitions to `failed` once the cap
    /// is reached, otherwise back to `queued` with linear backoff
    /// (`attempts * 30s`, spec §4.1).
    async fn fail(&self, job_id: i64, error_message: &str) -> anyhow::Result<()>;

    async fn metrics(&self) -> anyhow::Result<QueueMetrics>;

    /// Fetch a job row by id, mostly for tests and diagnostics.
    async fn find(&self, job_id: i64) -> anyhow::Result<Option<JobRecord>>;
}
