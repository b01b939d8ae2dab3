//! Stage 4 (Profile) artifact: the merged business profile plus five
//! auxiliary one-to-many tables for denormalized lists.
//!
//! Spec §3 names "locations, services, product categories with nested
//! items, certifications, awards, partnerships" but counts exactly five
//! auxiliary tables; this implementation collapses certifications and
//! awards into one `reputation_items` table distinguished by a `kind`
//! column, leaving locations / services / product_categories /
//! reputation_items / partnerships as the five (see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The full structured profile, as both the scalar columns written to
/// `profile` and the opaque JSON blob kept alongside for replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileArtifact {
    pub company_id: String,

    // Identity
    pub company_name: Option<String>,
    pub cnpj: Option<String>,
    pub description: Option<String>,
    pub founding_year: Option<String>,
    pub employee_range: Option<String>,

    // Classification
    pub industry: Option<String>,
    pub business_model: Option<String>,
    pub target_audience: Option<String>,
    pub geographic_coverage: Option<String>,

    // Offerings
    pub products: Vec<Product>,
    pub services: Vec<Service>,

    // Reputation
    pub certifications: Vec<String>,
    pub awards: Vec<String>,
    pub partnerships: Vec<String>,
    pub client_list: Vec<String>,

    // Contact
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub headquarters_address: Option<String>,
    pub locations: Vec<Location>,

    pub sources: Vec<String>,
}

impl ProfileArtifact {
    /// Mirrors the original's `CompanyProfile.is_empty()`: true when none
    /// of identity, classification, offerings, or contact carry data.
    pub fn is_empty_profile(&self) -> bool {
        let identity_empty =
            self.company_name.is_none() && self.cnpj.is_none() && self.description.is_none();
        let classification_empty = self.industry.is_none()
            && self.business_model.is_none()
            && self.target_audience.is_none();
        let offerings_empty = self.products.is_empty() && self.services.is_empty();
        let contact_empty =
            self.website_url.is_none() && self.emails.is_empty() && self.phones.is_empty();
        identity_empty && classification_empty && offerings_empty && contact_empty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub category: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ReputationKind {
    Certification,
    Award,
}

/// One row of the `reputation_items` auxiliary table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Certification {
    pub id: i64,
    pub company_id: String,
    pub kind: ReputationKind,
    pub name: String,
}

/// One row of the `partnerships` auxiliary table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Partnership {
    pub id: i64,
    pub company_id: String,
    pub partner_name: String,
}

/// Database-facing row shape for the `profile` table itself (scalar
/// columns + the opaque full-profile JSON blob). Separate from
/// [`ProfileArtifact`] so callers can query metadata without decoding the
/// blob.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub company_id: String,
    pub company_name: Option<String>,
    pub cnpj: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    pub profile_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
