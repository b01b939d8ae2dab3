//! Wire types for the SERP provider.

use serde::{Deserialize, Serialize};

/// A single search result row, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRow {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Outcome of a `search`/`search_batch` call.
///
/// `total_failure` is set when retries are exhausted with no usable rows;
/// callers persist an empty marker artifact in that case rather than
/// treating it as a hard error, per the orchestration contract.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub rows: Vec<SearchRow>,
    pub retries_consumed: u32,
    pub total_failure: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub rows_per_query: Vec<Vec<SearchRow>>,
    pub retries_consumed: u32,
    pub total_failure: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProviderRequest<'a> {
    pub queries: &'a [String],
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub num: u32,
    pub page: u32,
    pub location: String,
    pub lr: String,
    pub gl: String,
    pub hl: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponseEntry {
    #[serde(default)]
    pub results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// The provider's envelope: `data` is either a single object (single-query
/// call) or an array (batch call). Malformed/missing shapes parse to
/// `Unknown` and map to empty rows rather than an error.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderEnvelope {
    #[serde(default)]
    pub data: Option<ProviderData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProviderData {
    Single(ProviderResponseEntry),
    Batch(Vec<ProviderResponseEntry>),
}

pub(crate) fn parse_single(data: Option<ProviderData>) -> Vec<SearchRow> {
    match data {
        Some(ProviderData::Single(entry)) => into_rows(entry.results),
        Some(ProviderData::Batch(entries)) => entries
            .into_iter()
            .next()
            .map(|e| into_rows(e.results))
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

pub(crate) fn parse_batch(data: Option<ProviderData>, expected: usize) -> Vec<Vec<SearchRow>> {
    match data {
        Some(ProviderData::Batch(entries)) => {
            entries.into_iter().map(|e| into_rows(e.results)).collect()
        }
        Some(ProviderData::Single(entry)) => vec![into_rows(entry.results)],
        None => vec![Vec::new(); expected],
    }
}

fn into_rows(raw: Vec<RawResult>) -> Vec<SearchRow> {
    raw.into_iter()
        .map(|r| SearchRow {
            title: r.title.unwrap_or_default().trim().to_string(),
            link: r.link.unwrap_or_default().trim().to_string(),
            snippet: r.snippet.unwrap_or_default().trim().to_string(),
        })
        .collect()
}
