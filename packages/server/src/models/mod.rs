//! Domain types shared across the queue, orchestration, and ingress layers.
//!
//! Each artifact type here is owned exclusively by its producing stage;
//! later stages read but never mutate earlier artifacts (see spec §3
//! "Ownership").

mod chunk;
mod discovery;
mod job;
mod profile;
mod search;

pub use chunk::ChunkArtifact;
pub use discovery::{DiscoveryArtifact, DiscoveryStatus};
pub use job::{JobRecord, JobStatus};
pub use profile::{
    Certification, Location, Partnership, Product, ProfileArtifact, Service,
};
pub use search::{SearchArtifact, SerpRow};

/// The pipeline's primary key: Brazil's eight-digit company tax-registry
/// identifier, the `cnpj_basico`. Opaque; no cross-company references.
pub type CompanyId = String;
