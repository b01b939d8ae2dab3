//! Stage 1 (Search, synchronous): builds a query from registry metadata,
//! calls the search client, and persists one search artifact row — even
//! when zero results come back, to record the attempt and prevent churn
//! (spec §4.4).

use tracing::info;

use super::PipelineDeps;
use crate::models::SerpRow;

pub struct Stage1Input<'a> {
    pub company_id: &'a str,
    pub corporate_name: Option<&'a str>,
    pub trade_name: Option<&'a str>,
    pub municipality: Option<&'a str>,
}

pub struct Stage1Output {
    pub artifact_id: i64,
    pub result_count: usize,
    pub query_used: String,
}

/// Priority rule (spec §4.4): trade name + municipality + "site oficial";
/// else cleaned corporate name + municipality + "site oficial"; else bare
/// "site oficial". Ground truth: `app/api/v2/serper.py::_build_search_query`.
pub fn build_query(corporate_name: Option<&str>, trade_name: Option<&str>, municipality: Option<&str>) -> String {
    let city = municipality.unwrap_or("").trim();

    if let Some(tn) = trade_name.map(str::trim).filter(|s| !s.is_empty()) {
        return format!("{tn} {city} site oficial").trim().to_string();
    }

    if let Some(rs) = corporate_name.map(str::trim).filter(|s| !s.is_empty()) {
        let cleaned = clean_corporate_suffixes(rs);
        if !cleaned.is_empty() {
            return format!("{cleaned} {city} site oficial").trim().to_string();
        }
    }

    if !city.is_empty() {
        return format!("site oficial {city}").trim().to_string();
    }

    "site oficial".to_string()
}

fn clean_corporate_suffixes(name: &str) -> String {
    let mut cleaned = name.to_string();
    for suffix in [" LTDA", " S.A.", " EIRELI", " ME", " EPP", " S/A"] {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned.trim().to_string()
}

pub async fn run_search(deps: &PipelineDeps, input: Stage1Input<'_>) -> anyhow::Result<Stage1Output> {
    let query = build_query(input.corporate_name, input.trade_name, input.municipality);

    let outcome = deps.search_client.search(&query, 10).await?;
    let rows: Vec<SerpRow> = outcome.rows.into_iter().map(SerpRow::from).collect();

    let table = deps.qualified("search");
    let results_json = serde_json::to_value(&rows)?;
    let row: (i64,) = sqlx::query_as(&format!(
        r#"
        INSERT INTO {table}
            (company_id, corporate_name, trade_name, municipality, results, result_count, query_used)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#
    ))
    .bind(input.company_id)
    .bind(input.corporate_name)
    .bind(input.trade_name)
    .bind(input.municipality)
    .bind(&results_json)
    .bind(rows.len() as i32)
    .bind(&query)
    .fetch_one(&deps.db)
    .await?;

    info!(company_id = input.company_id, result_count = rows.len(), query = %query, "stage1 search complete");

    Ok(Stage1Output { artifact_id: row.0, result_count: rows.len(), query_used: query })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_trade_name_over_corporate_name() {
        let q = build_query(Some("ACME LTDA"), Some("Acme"), Some("Sao Paulo"));
        assert_eq!(q, "Acme Sao Paulo site oficial");
    }

    #[test]
    fn falls_back_to_cleaned_corporate_name() {
        let q = build_query(Some("ACME Comercio LTDA"), None, Some("Sao Paulo"));
        assert_eq!(q, "ACME Comercio Sao Paulo site oficial");
    }

    #[test]
    fn falls_back_to_bare_site_oficial_with_no_metadata() {
        let q = build_query(None, None, None);
        assert_eq!(q, "site oficial");
    }

    #[test]
    fn falls_back_to_city_only_when_no_names() {
        let q = build_query(None, None, Some("Curitiba"));
        assert_eq!(q, "site oficial Curitiba");
    }
}
