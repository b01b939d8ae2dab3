//! Shared startup wiring for both binaries (`bin/server.rs`,
//! `bin/worker.rs`): one database pool, one `PipelineDeps`, two queues.
//! Keeping this in one place is what makes SPEC_FULL.md §9 decision 1 (a
//! single stage 4 runner, called from both ingress and the worker) hold in
//! practice — both binaries build the exact same collaborator wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use llm_pool::ProviderPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::collaborators::{
    FixedSizeChunker, HttpScraper, LlmDiscoveryChooser, LlmMerger, LlmProfileExtractor,
};
use crate::orchestration::PipelineDeps;
use crate::queue::{PostgresQueue, Queue};
use crate::Config;

pub const SCHEMA: &str = "busca_fornecedor";

pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(config.db_pool_min)
        .max_connections(config.db_pool_max)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")
}

pub struct Bootstrapped {
    pub pool: PgPool,
    pub pipeline: PipelineDeps,
    pub discovery_queue: Arc<dyn Queue>,
    pub profile_queue: Arc<dyn Queue>,
}

pub fn build(pool: PgPool, config: &Config) -> Bootstrapped {
    let search_client_config = search_client::SearchClientConfig {
        api_key: config.serper_api_key.clone(),
        base_url: config.serper_base_url.clone(),
        ..Default::default()
    };
    let search_client = Arc::new(search_client::SearchClient::new(search_client_config));
    let llm_pool = Arc::new(ProviderPool::from_config_file(&config.llm_providers_config));

    let pipeline = PipelineDeps {
        db: pool.clone(),
        schema: SCHEMA,
        search_client,
        discovery_chooser: Arc::new(LlmDiscoveryChooser::new(llm_pool.clone())),
        scraper: Arc::new(HttpScraper::default()),
        chunker: Arc::new(FixedSizeChunker::default()),
        profile_extractor: Arc::new(LlmProfileExtractor::new(llm_pool.clone())),
        merger: Arc::new(LlmMerger::new(llm_pool)),
    };

    let discovery_queue: Arc<dyn Queue> = Arc::new(PostgresQueue::new(pool.clone(), SCHEMA, "queue_discovery"));
    let profile_queue: Arc<dyn Queue> = Arc::new(PostgresQueue::new(pool.clone(), SCHEMA, "queue_profile"));

    Bootstrapped { pool, pipeline, discovery_queue, profile_queue }
}
