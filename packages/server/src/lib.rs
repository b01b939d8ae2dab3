//! Pipeline execution substrate for the CNPJ website-discovery and
//! business-profile assembly pipeline.
//!
//! Four stages — Search, Discovery, Scrape, Profile — chained per company,
//! two of them (Discovery, Profile) driven by a durable Postgres-backed
//! queue so autonomous worker processes can claim, retry, and restart work
//! without losing it. See `SPEC_FULL.md` at the workspace root for the full
//! contract.

pub mod bootstrap;
pub mod collaborators;
pub mod config;
pub mod http;
pub mod models;
pub mod orchestration;
pub mod queue;

pub use config::Config;
