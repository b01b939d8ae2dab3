//! Stage 2 (Discovery, queue-driven), per spec §4.4:
//!
//! 1. Load the most recent search artifact; absent → `not_found` + ack.
//! 2. Filter by domain blacklist, dedupe by URL.
//! 3. No survivors → `not_found` + ack.
//! 4. Call the discovery chooser.
//! 5. Upsert the discovery row. Ack.
//! 6. Any unhandled exception → `error` row, re-raise so the queue
//!    records the failure.

use tracing::{error, info, warn};

use super::blacklist::filter_and_dedupe;
use super::PipelineDeps;
use crate::collaborators::discovery_chooser::DiscoveryInput;
use crate::models::{DiscoveryStatus, SearchArtifact};

pub async fn run_discovery(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<()> {
    match run_discovery_inner(deps, company_id).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(company_id, error = %e, "stage2 discovery failed, recording error row");
            if let Err(write_err) = upsert_discovery(
                deps,
                company_id,
                None,
                DiscoveryStatus::Error,
                None,
                None,
                Some(format!("error: {e}")),
            )
            .await
            {
                error!(company_id, error = %write_err, "failed to persist discovery error row");
            }
            Err(e)
        }
    }
}

async fn run_discovery_inner(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<()> {
    let Some(search) = load_latest_search(deps, company_id).await? else {
        info!(company_id, "stage2: no search artifact, writing not_found");
        upsert_discovery(
            deps,
            company_id,
            None,
            DiscoveryStatus::NotFound,
            None,
            None,
            Some("no search artifact found".to_string()),
        )
        .await?;
        return Ok(());
    };

    let rows = search.rows();
    let candidates = filter_and_dedupe(&rows);
    if candidates.is_empty() {
        warn!(company_id, "stage2: all SERP rows filtered by blacklist, writing not_found");
        upsert_discovery(
            deps,
            company_id,
            Some(search.id),
            DiscoveryStatus::NotFound,
            None,
            None,
            Some("all search results were blacklisted".to_string()),
        )
        .await?;
        return Ok(());
    }

    let choice = deps
        .discovery_chooser
        .choose(
            DiscoveryInput {
                company_id,
                corporate_name: search.corporate_name.as_deref(),
                trade_name: search.trade_name.as_deref(),
                municipality: search.municipality.as_deref(),
            },
            &candidates,
        )
        .await?;

    let status = if choice.url.is_some() { DiscoveryStatus::Found } else { DiscoveryStatus::NotFound };
    upsert_discovery(deps, company_id, Some(search.id), status, choice.url, choice.confidence, choice.reasoning)
        .await?;
    Ok(())
}

async fn load_latest_search(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<Option<SearchArtifact>> {
    let table = deps.qualified("search");
    let row = sqlx::query_as::<_, SearchArtifact>(&format!(
        r#"
        SELECT id, company_id, corporate_name, trade_name, municipality, results, result_count,
               query_used, created_at
        FROM {table}
        WHERE company_id = $1
        ORDER BY id DESC
        LIMIT 1
        "#
    ))
    .bind(company_id)
    .fetch_optional(&deps.db)
    .await?;
    Ok(row)
}

/// Replaces the prior discovery row for `company_id` (spec §3 "Upsert
/// semantics": re-running replaces the prior row).
async fn upsert_discovery(
    deps: &PipelineDeps,
    company_id: &str,
    search_id: Option<i64>,
    status: DiscoveryStatus,
    url: Option<String>,
    confidence: Option<f64>,
    reasoning: Option<String>,
) -> anyhow::Result<()> {
    let table = deps.qualified("discovery");
    sqlx::query(&format!(
        r#"
        INSERT INTO {table} (company_id, website_url, status, search_id, confidence, reasoning)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (company_id) DO UPDATE SET
            website_url = EXCLUDED.website_url,
            status = EXCLUDED.status,
            search_id = EXCLUDED.search_id,
            confidence = EXCLUDED.confidence,
            reasoning = EXCLUDED.reasoning,
            updated_at = now()
        "#
    ))
    .bind(company_id)
    .bind(&url)
    .bind(status)
    .bind(search_id)
    .bind(confidence)
    .bind(&reasoning)
    .execute(&deps.db)
    .await?;
    info!(company_id, %status, url = url.as_deref().unwrap_or(""), "stage2 discovery row written");
    Ok(())
}
