//! Per-stage job runners (spec §4.4), one runner function per stage, each
//! taking its dependencies as explicit `Arc<...>` arguments — no hidden
//! process-wide state beyond the database handle (SPEC_FULL.md §9,
//! "Global singletons" design note).
//!
//! Stage 4 is invoked identically by the ingress handler and by the
//! worker's claim loop (SPEC_FULL.md §9 decision 1): there is exactly one
//! `run_profile_job`, not two duplicated code paths.

mod blacklist;
pub mod stage1_search;
pub mod stage2_discovery;
pub mod stage3_scrape;
pub mod stage4_profile;

use std::sync::Arc;

use sqlx::PgPool;

use crate::collaborators::{Chunker, DiscoveryChooser, Merger, ProfileExtractor, Scraper};
use search_client::SearchClient;

/// Shared dependencies every stage runner closes over. Built once at
/// startup by the ingress binary and the worker binary alike, then handed
/// down — the "explicit configuration struct" SPEC_FULL.md §9 calls for
/// in place of hidden singletons.
pub struct PipelineDeps {
    pub db: PgPool,
    pub schema: &'static str,
    pub search_client: Arc<SearchClient>,
    pub discovery_chooser: Arc<dyn DiscoveryChooser>,
    pub scraper: Arc<dyn Scraper>,
    pub chunker: Arc<dyn Chunker>,
    pub profile_extractor: Arc<dyn ProfileExtractor>,
    pub merger: Arc<dyn Merger>,
}

impl PipelineDeps {
    fn qualified(&self, table: &str) -> String {
        format!("\"{}\".{}", self.schema, table)
    }
}
