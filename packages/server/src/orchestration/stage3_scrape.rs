//! Stage 3 (Scrape, synchronous), per spec §4.4: scrape the seed URL,
//! aggregate into one text, chunk it, enrich each chunk with the first
//! five pages it spans, look up the discovery id for (best-effort)
//! traceability, and batch-insert all chunks in one transaction.

use tracing::info;

use super::PipelineDeps;

const MAX_PAGES_PER_CHUNK: usize = 5;
const MAX_SUBPAGES: usize = 20;

pub struct Stage3Output {
    pub chunks_saved: usize,
    pub total_tokens: i64,
    pub pages_scraped: usize,
}

pub async fn run_scrape(deps: &PipelineDeps, company_id: &str, website_url: &str) -> anyhow::Result<Stage3Output> {
    let pages = deps.scraper.scrape(website_url, MAX_SUBPAGES).await?;
    let successful: Vec<_> = pages.iter().filter(|p| p.success).collect();

    let aggregated: String = successful
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let chunks = deps.chunker.chunk(&aggregated).await?;
    let page_urls: Vec<String> = successful.iter().map(|p| p.url.clone()).collect();
    let discovery_id = load_discovery_id(deps, company_id).await?;

    let total_tokens: i64 = chunks.iter().map(|c| c.tokens as i64).sum();
    let chunk_count = chunks.len();

    let mut tx = deps.db.begin().await?;
    let table = deps.qualified("chunks");

    // One transaction for all chunks of this company, per spec §3/§4.4.
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1"))
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

    for chunk in &chunks {
        // Respect the chunker's own page attribution when it provides one;
        // only fall back to the global first-five pages when it doesn't.
        let pages_for_chunk: Vec<String> = if chunk.pages_included.is_empty() {
            page_urls.iter().take(MAX_PAGES_PER_CHUNK).cloned().collect()
        } else {
            chunk.pages_included.iter().take(MAX_PAGES_PER_CHUNK).cloned().collect()
        };
        let source_urls = serde_json::to_value(&pages_for_chunk)?;
        sqlx::query(&format!(
            r#"
            INSERT INTO {table}
                (company_id, website_url, chunk_index, total_chunks, content, token_count,
                 source_urls, discovery_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#
        ))
        .bind(company_id)
        .bind(website_url)
        .bind(chunk.index)
        .bind(chunk.total)
        .bind(&chunk.content)
        .bind(chunk.tokens)
        .bind(&source_urls)
        .bind(discovery_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(company_id, website_url, chunks = chunk_count, total_tokens, "stage3 scrape complete");

    Ok(Stage3Output { chunks_saved: chunk_count, total_tokens, pages_scraped: successful.len() })
}

async fn load_discovery_id(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<Option<i64>> {
    let table = deps.qualified("discovery");
    let row: Option<(i64,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE company_id = $1"))
        .bind(company_id)
        .fetch_optional(&deps.db)
        .await?;
    Ok(row.map(|r| r.0))
}
