//! Weighted, health-aware LLM provider pool.
//!
//! Routes per-call invocations across a set of interchangeable upstream
//! providers (OpenAI-chat-completions-compatible wire protocol), tracking a
//! rolling health score per provider and gating admission so that `HIGH`
//! priority calls (discovery, link selection) never wait behind `NORMAL`
//! ones (profile extraction).

mod admission;
mod client;
mod config;
mod error;
mod health;
mod pool;
mod selection;
mod types;

pub use config::load_provider_configs;
pub use error::{FailureKind, LlmError, Result};
pub use health::{HealthMonitor, Status as HealthStatus};
pub use pool::ProviderPool;
pub use types::{CallOptions, CallResponse, ChatMessage, Priority, ProviderRecord};
