//! Ingress HTTP entry point. Grounded on `server/main.rs`'s tracing init +
//! pool connect + migrate + serve sequence.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use server_core::http::{build_router, AppState};
use server_core::queue::recovery;
use server_core::{bootstrap, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting business profile pipeline ingress");

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = bootstrap::connect(&config).await?;
    tracing::info!("database connected");

    sqlx::migrate!("./migrations").run(&pool).await.context("failed to run migrations")?;
    tracing::info!("migrations complete");

    let bootstrapped = bootstrap::build(pool.clone(), &config);
    let state = Arc::new(AppState {
        db: pool.clone(),
        config: config.clone(),
        pipeline: bootstrapped.pipeline,
        discovery_queue: bootstrapped.discovery_queue,
        profile_queue: bootstrapped.profile_queue,
    });

    // SPEC_FULL.md §9 decision 2: the recovery sweep runs alongside the
    // ingress binary too, not only the standalone worker, since the
    // ingress process alone is a valid deployment topology.
    let shutdown = CancellationToken::new();
    let recovery_handle = tokio::spawn(recovery::run_recovery_loop(
        pool,
        bootstrap::SCHEMA,
        Duration::from_secs(config.recovery_sweep_interval_secs),
        Duration::from_secs(config.recovery_grace_period_secs.max(0) as u64),
        shutdown.clone(),
    ));

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(addr = %addr, "binding listener");
    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind to address")?;

    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .await
        .context("server error")?;

    shutdown.cancel();
    let _ = recovery_handle.await;
    Ok(())
}
