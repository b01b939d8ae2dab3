//! Standalone worker process: claims from both queues and runs the
//! matching stage runner, with a recovery sweep running alongside.
//! Grounded on `kernel/jobs/worker.rs`'s poll/claim/dispatch/ack loop
//! shape, adapted to two fixed queues rather than a generic command
//! registry (this pipeline has exactly two queued stages, not an open set
//! of job types).

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use server_core::orchestration::{stage2_discovery, stage4_profile, PipelineDeps};
use server_core::queue::{recovery, Queue};
use server_core::{bootstrap, Config};

const CLAIM_BATCH_SIZE: i64 = 10;
const LIVENESS_LOG_EVERY_N_EMPTY_CYCLES: u32 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let pool = bootstrap::connect(&config).await?;
    tracing::info!("database connected");

    let bootstrapped = bootstrap::build(pool.clone(), &config);
    let worker_id = worker_id();
    info!(worker_id, "worker starting");

    let shutdown = CancellationToken::new();
    let recovery_handle = tokio::spawn(recovery::run_recovery_loop(
        pool,
        bootstrap::SCHEMA,
        Duration::from_secs(config.recovery_sweep_interval_secs),
        Duration::from_secs(config.recovery_grace_period_secs.max(0) as u64),
        shutdown.clone(),
    ));

    let claim_loop = run_claim_loop(
        worker_id,
        bootstrapped.pipeline,
        bootstrapped.discovery_queue,
        bootstrapped.profile_queue,
        Duration::from_secs(config.worker_poll_interval_secs),
        shutdown.clone(),
    );

    tokio::select! {
        _ = claim_loop => {}
        _ = wait_for_shutdown_signal() => {
            info!("shutdown signal received, finishing in-flight work");
            shutdown.cancel();
        }
    }

    shutdown.cancel();
    let _ = recovery_handle.await;
    info!("worker stopped");
    Ok(())
}

fn worker_id() -> String {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    format!("{hostname}-{}", process::id())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sigterm) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run_claim_loop(
    worker_id: String,
    pipeline: PipelineDeps,
    discovery_queue: Arc<dyn Queue>,
    profile_queue: Arc<dyn Queue>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut empty_cycles: u32 = 0;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let discovery_claims = discovery_queue.claim(&worker_id, CLAIM_BATCH_SIZE).await.unwrap_or_else(|e| {
            warn!(error = %e, "discovery claim failed");
            Vec::new()
        });
        let profile_claims = profile_queue.claim(&worker_id, CLAIM_BATCH_SIZE).await.unwrap_or_else(|e| {
            warn!(error = %e, "profile claim failed");
            Vec::new()
        });

        if discovery_claims.is_empty() && profile_claims.is_empty() {
            empty_cycles += 1;
            if empty_cycles % LIVENESS_LOG_EVERY_N_EMPTY_CYCLES == 0 {
                info!(worker_id, "idle, no queued jobs");
            }
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = shutdown.cancelled() => break,
            }
            continue;
        }
        empty_cycles = 0;

        for claim in discovery_claims {
            match stage2_discovery::run_discovery(&pipeline, &claim.company_id).await {
                Ok(()) => {
                    if let Err(e) = discovery_queue.ack(claim.job_id).await {
                        error!(job_id = claim.job_id, error = %e, "failed to ack discovery job");
                    }
                }
                Err(e) => {
                    if let Err(ack_err) = discovery_queue.fail(claim.job_id, &e.to_string()).await {
                        error!(job_id = claim.job_id, error = %ack_err, "failed to record discovery failure");
                    }
                }
            }
        }

        for claim in profile_claims {
            match stage4_profile::run_profile_job(&pipeline, &claim.company_id).await {
                Ok(_) => {
                    if let Err(e) = profile_queue.ack(claim.job_id).await {
                        error!(job_id = claim.job_id, error = %e, "failed to ack profile job");
                    }
                }
                Err(e) => {
                    if let Err(ack_err) = profile_queue.fail(claim.job_id, &e.to_string()).await {
                        error!(job_id = claim.job_id, error = %ack_err, "failed to record profile failure");
                    }
                }
            }
        }
    }
}
