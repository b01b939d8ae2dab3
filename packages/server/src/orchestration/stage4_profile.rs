//! Stage 4 (Profile), per spec §4.4 / grounded on `run_profile_job.py`:
//! load all chunks for a company, extract a partial profile from each
//! non-trivial chunk in parallel, drop empty partials, merge the
//! survivors into one profile, and persist it — rewriting the profile row
//! plus all five auxiliary tables in a single transaction.
//!
//! This is the single runner invoked by both the ingress
//! `POST /montagem_perfil` handler and the worker's profile-queue claim
//! loop (SPEC_FULL.md §9 decision 1): there is no duplicated in-process
//! vs. queued code path.

use tracing::{info, warn};

use super::PipelineDeps;
use crate::models::{ChunkArtifact, ProfileArtifact, ReputationKind};

/// Chunks whose trimmed content is shorter than this are skipped before
/// extraction — mirrors the original's own "too short to be useful"
/// cutoff.
const MIN_CHUNK_CONTENT_LEN: usize = 100;

pub struct Stage4Output {
    pub profile_written: bool,
    pub chunks_considered: usize,
    pub partials_extracted: usize,
}

pub async fn run_profile_job(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<Stage4Output> {
    let chunks = load_chunks(deps, company_id).await?;
    let eligible: Vec<&ChunkArtifact> =
        chunks.iter().filter(|c| c.content.trim().len() >= MIN_CHUNK_CONTENT_LEN).collect();

    let extractions = futures::future::join_all(eligible.iter().map(|chunk| async move {
        deps.profile_extractor.extract(&chunk.content).await
    }))
    .await;

    let mut partials: Vec<ProfileArtifact> = Vec::new();
    for (chunk, result) in eligible.iter().zip(extractions) {
        match result {
            Ok(profile) if !profile.is_empty_profile() => partials.push(profile),
            Ok(_) => {}
            Err(e) => warn!(company_id, chunk_index = chunk.chunk_index, error = %e, "chunk extraction failed, skipping"),
        }
    }

    if partials.is_empty() {
        info!(company_id, chunks_considered = eligible.len(), "stage4: no usable partial profiles, skipping write");
        return Ok(Stage4Output { profile_written: false, chunks_considered: eligible.len(), partials_extracted: 0 });
    }

    let partials_extracted = partials.len();
    // On merger failure, fall back to the first non-empty partial rather
    // than failing the job (spec §4.4 step 4). This covers any `Merger`
    // impl's errors, not just the default's own JSON-parse failures.
    let mut merged = match deps.merger.merge(&partials).await {
        Ok(m) => m,
        Err(e) => {
            warn!(company_id, error = %e, "merger failed, falling back to first non-empty partial");
            partials
                .iter()
                .find(|p| !p.is_empty_profile())
                .cloned()
                .unwrap_or_else(|| partials[0].clone())
        }
    };
    merged.company_id = company_id.to_string();

    persist_profile(deps, company_id, &merged).await?;
    info!(company_id, partials_extracted, "stage4 profile written");

    Ok(Stage4Output { profile_written: true, chunks_considered: eligible.len(), partials_extracted })
}

async fn load_chunks(deps: &PipelineDeps, company_id: &str) -> anyhow::Result<Vec<ChunkArtifact>> {
    let table = deps.qualified("chunks");
    let chunks = sqlx::query_as::<_, ChunkArtifact>(&format!(
        r#"
        SELECT id, company_id, website_url, chunk_index, total_chunks, content, token_count,
               source_urls, discovery_id, created_at
        FROM {table}
        WHERE company_id = $1
        ORDER BY chunk_index ASC
        "#
    ))
    .bind(company_id)
    .fetch_all(&deps.db)
    .await?;
    Ok(chunks)
}

/// Upserts the `profile` row and fully rewrites the five auxiliary
/// one-to-many tables (delete-then-insert) in a single transaction, per
/// spec §3's upsert semantics.
async fn persist_profile(deps: &PipelineDeps, company_id: &str, profile: &ProfileArtifact) -> anyhow::Result<()> {
    let profile_table = deps.qualified("profile");
    let profile_json = serde_json::to_value(profile)?;

    let mut tx = deps.db.begin().await?;

    let row: (i64,) = sqlx::query_as(&format!(
        r#"
        INSERT INTO {profile_table}
            (company_id, company_name, cnpj, description, industry, website_url, profile_json)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (company_id) DO UPDATE SET
            company_name = EXCLUDED.company_name,
            cnpj = EXCLUDED.cnpj,
            description = EXCLUDED.description,
            industry = EXCLUDED.industry,
            website_url = EXCLUDED.website_url,
            profile_json = EXCLUDED.profile_json,
            updated_at = now()
        RETURNING id
        "#
    ))
    .bind(company_id)
    .bind(&profile.company_name)
    .bind(&profile.cnpj)
    .bind(&profile.description)
    .bind(&profile.industry)
    .bind(&profile.website_url)
    .bind(&profile_json)
    .fetch_one(&mut *tx)
    .await?;
    let profile_id = row.0;

    rewrite_locations(&mut tx, deps, company_id, profile_id, profile).await?;
    rewrite_services(&mut tx, deps, company_id, profile_id, profile).await?;
    rewrite_product_categories(&mut tx, deps, company_id, profile_id, profile).await?;
    rewrite_reputation_items(&mut tx, deps, company_id, profile_id, profile).await?;
    rewrite_partnerships(&mut tx, deps, company_id, profile_id, profile).await?;

    tx.commit().await?;
    Ok(())
}

async fn rewrite_locations(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    deps: &PipelineDeps,
    company_id: &str,
    profile_id: i64,
    profile: &ProfileArtifact,
) -> anyhow::Result<()> {
    let table = deps.qualified("locations");
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1")).bind(company_id).execute(&mut **tx).await?;
    for loc in &profile.locations {
        sqlx::query(&format!("INSERT INTO {table} (company_id, profile_id, address) VALUES ($1, $2, $3)"))
            .bind(company_id)
            .bind(profile_id)
            .bind(&loc.address)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn rewrite_services(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    deps: &PipelineDeps,
    company_id: &str,
    profile_id: i64,
    profile: &ProfileArtifact,
) -> anyhow::Result<()> {
    let table = deps.qualified("services");
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1")).bind(company_id).execute(&mut **tx).await?;
    for svc in &profile.services {
        sqlx::query(&format!(
            "INSERT INTO {table} (company_id, profile_id, name, description) VALUES ($1, $2, $3, $4)"
        ))
        .bind(company_id)
        .bind(profile_id)
        .bind(&svc.name)
        .bind(&svc.description)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn rewrite_product_categories(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    deps: &PipelineDeps,
    company_id: &str,
    profile_id: i64,
    profile: &ProfileArtifact,
) -> anyhow::Result<()> {
    let table = deps.qualified("product_categories");
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1")).bind(company_id).execute(&mut **tx).await?;
    for product in &profile.products {
        let items = serde_json::to_value(&product.items)?;
        sqlx::query(&format!(
            "INSERT INTO {table} (company_id, profile_id, category, items) VALUES ($1, $2, $3, $4)"
        ))
        .bind(company_id)
        .bind(profile_id)
        .bind(&product.category)
        .bind(&items)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn rewrite_reputation_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    deps: &PipelineDeps,
    company_id: &str,
    profile_id: i64,
    profile: &ProfileArtifact,
) -> anyhow::Result<()> {
    let table = deps.qualified("reputation_items");
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1")).bind(company_id).execute(&mut **tx).await?;
    for name in &profile.certifications {
        sqlx::query(&format!("INSERT INTO {table} (company_id, profile_id, kind, name) VALUES ($1, $2, $3, $4)"))
            .bind(company_id)
            .bind(profile_id)
            .bind(ReputationKind::Certification)
            .bind(name)
            .execute(&mut **tx)
            .await?;
    }
    for name in &profile.awards {
        sqlx::query(&format!("INSERT INTO {table} (company_id, profile_id, kind, name) VALUES ($1, $2, $3, $4)"))
            .bind(company_id)
            .bind(profile_id)
            .bind(ReputationKind::Award)
            .bind(name)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn rewrite_partnerships(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    deps: &PipelineDeps,
    company_id: &str,
    profile_id: i64,
    profile: &ProfileArtifact,
) -> anyhow::Result<()> {
    let table = deps.qualified("partnerships");
    sqlx::query(&format!("DELETE FROM {table} WHERE company_id = $1")).bind(company_id).execute(&mut **tx).await?;
    for partner_name in &profile.partnerships {
        sqlx::query(&format!("INSERT INTO {table} (company_id, profile_id, partner_name) VALUES ($1, $2, $3)"))
            .bind(company_id)
            .bind(profile_id)
            .bind(partner_name)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::models::ProfileArtifact;

    #[test]
    fn default_profile_is_considered_empty() {
        assert!(ProfileArtifact::default().is_empty_profile());
    }
}
