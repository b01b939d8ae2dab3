//! Stale-lock recovery sweep (SPEC_FULL.md §9 decision 2 — the Python
//! original has no equivalent; this is the specification-mandated
//! redesign). Periodically resets `processing` rows whose `locked_at` is
//! older than `grace_period` back to `queued`, as if they had never been
//! claimed, so a crashed worker never strands a job forever.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resets stale `processing` rows in `"{schema}".{table}` back to
/// `queued`, clearing lock fields. Returns the number of rows reset.
pub async fn sweep_stale_locks(
    pool: &PgPool,
    schema: &str,
    table: &str,
    grace_period: Duration,
) -> anyhow::Result<u64> {
    let qualified = format!("\"{schema}\".{table}");
    let grace_secs = grace_period.as_secs() as i64;

    let result = sqlx::query(&format!(
        r#"
        UPDATE {qualified}
        SET status = 'queued', locked_at = NULL, locked_by = NULL, updated_at = now()
        WHERE status = 'processing'
          AND locked_at IS NOT NULL
          AND locked_at < now() - ($1 * interval '1 second')
        "#
    ))
    .bind(grace_secs)
    .execute(pool)
    .await?;

    let reset = result.rows_affected();
    if reset > 0 {
        warn!(table, reset, "recovery sweep reclaimed stale processing rows");
    }
    Ok(reset)
}

/// Runs [`sweep_stale_locks`] against both queues on a fixed interval
/// until `shutdown` fires. Spawned alongside each worker (spec §9
/// decision 2), mirroring `kernel/jobs/worker.rs`'s own heartbeat-task
/// shape (`tokio::spawn` + `interval` + `select!`).
pub async fn run_recovery_loop(
    pool: PgPool,
    schema: &'static str,
    interval: Duration,
    grace_period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    info!(schema, ?interval, ?grace_period, "recovery sweep loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for table in ["queue_discovery", "queue_profile"] {
                    if let Err(e) = sweep_stale_locks(&pool, schema, table, grace_period).await {
                        warn!(table, error = %e, "recovery sweep failed");
                    }
                }
            }
            _ = shutdown.cancelled() => {
                info!("recovery sweep loop shutting down");
                break;
            }
        }
    }
}
