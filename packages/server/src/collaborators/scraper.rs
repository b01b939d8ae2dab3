//! `Scraper`: `(seedUrl, maxSubpages) -> [{url, content, success}]`.

use async_trait::async_trait;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub content: String,
    pub success: bool,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, seed_url: &str, max_subpages: usize) -> anyhow::Result<Vec<ScrapedPage>>;
}

/// Plain-GET default scraper: fetches the seed page only (no HTML link
/// discovery or bot-defence handling — out of core scope per spec §1,
/// which treats the scraping engine as an external collaborator).
pub struct HttpScraper {
    client: reqwest::Client,
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(&self, seed_url: &str, max_subpages: usize) -> anyhow::Result<Vec<ScrapedPage>> {
        let _ = max_subpages;
        debug!(seed_url, "scraping seed page");
        let page = match self.client.get(seed_url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) => ScrapedPage { url: seed_url.to_string(), content: body, success: true },
                Err(e) => {
                    warn!(seed_url, error = %e, "failed reading scrape response body");
                    ScrapedPage { url: seed_url.to_string(), content: String::new(), success: false }
                }
            },
            Err(e) => {
                warn!(seed_url, error = %e, "scrape request failed");
                ScrapedPage { url: seed_url.to_string(), content: String::new(), success: false }
            }
        };
        Ok(vec![page])
    }
}
