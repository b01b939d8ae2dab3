//! Collaborator capability contracts (spec §6). These are deliberately
//! *not* full heuristic engines — HTML-scraping strategy, chunking
//! heuristics, and LLM prompt/schema content are out of core scope (spec
//! §1) — just enough of a default implementation to make the pipeline
//! runnable end to end. Swap any of these out without touching
//! orchestration.

mod chunker;
mod discovery_chooser;
mod merger;
mod profile_extractor;
mod scraper;

pub use chunker::{Chunker, FixedSizeChunker};
pub use discovery_chooser::{DiscoveryChooser, LlmDiscoveryChooser};
pub use merger::{LlmMerger, Merger};
pub use profile_extractor::{LlmProfileExtractor, ProfileExtractor};
pub use scraper::{HttpScraper, ScrapedPage, Scraper};
