//! Jobs: a single posting ingested from the upstream search API.
//!
//! A job's identity is its `external_id`; re-ingesting the same external id
//! updates the row in place rather than creating a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Location ────────────────────────────────────────────────────────────────

/// Location fields derived upstream. Each vector is parallel to the others
/// only where the upstream API makes it so; treat them independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
  #[serde(default)]
  pub cities:     Vec<String>,
  #[serde(default)]
  pub counties:   Vec<String>,
  #[serde(default)]
  pub regions:    Vec<String>,
  #[serde(default)]
  pub countries:  Vec<String>,
  /// Full human-readable locations, e.g. `"Austin, Texas, United States"`.
  #[serde(default)]
  pub locations:  Vec<String>,
  #[serde(default)]
  pub timezones:  Vec<String>,
  #[serde(default)]
  pub latitudes:  Vec<f64>,
  #[serde(default)]
  pub longitudes: Vec<f64>,
  /// The raw upstream location payload, kept opaque.
  pub raw:        Option<serde_json::Value>,
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// Where the posting was originally published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSourceInfo {
  /// ATS or board name, e.g. `"greenhouse"`.
  pub source:        Option<String>,
  pub source_type:   Option<String>,
  pub source_domain: Option<String>,
}

// ─── AI enrichment ───────────────────────────────────────────────────────────

/// Attributes produced by the upstream API's own analysis of the posting.
/// Opaque to this system: stored and returned, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiEnrichment {
  pub salary_currency:       Option<String>,
  pub salary_value:          Option<f64>,
  pub salary_min:            Option<f64>,
  pub salary_max:            Option<f64>,
  /// `HOUR`, `MONTH`, `YEAR`, …
  pub salary_unit:           Option<String>,
  pub experience_level:      Option<String>,
  pub work_arrangement:      Option<String>,
  pub office_days:           Option<f64>,
  #[serde(default)]
  pub remote_location:       Vec<String>,
  #[serde(default)]
  pub key_skills:            Vec<String>,
  pub core_responsibilities: Option<String>,
  pub requirements_summary:  Option<String>,
  pub working_hours:         Option<f64>,
  #[serde(default)]
  pub employment_types:      Vec<String>,
  pub job_language:          Option<String>,
  pub visa_sponsorship:      Option<bool>,
  pub hiring_manager_name:   Option<String>,
  #[serde(default)]
  pub benefits:              Vec<String>,
  #[serde(default)]
  pub taxonomies:            Vec<String>,
}

impl AiEnrichment {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

// ─── Job ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub job_id:           Uuid,
  pub external_id:      String,
  pub organization_id:  Uuid,
  pub title:            String,
  pub url:              Option<String>,
  pub date_posted:      Option<DateTime<Utc>>,
  pub date_created:     Option<DateTime<Utc>>,
  pub valid_through:    Option<DateTime<Utc>>,
  pub description:      Option<String>,
  pub location:         JobLocation,
  pub remote:           Option<bool>,
  pub employment_types: Vec<String>,
  /// Upstream salary payload, stored verbatim.
  pub salary_raw:       Option<serde_json::Value>,
  pub source:           JobSourceInfo,
  pub ai:               Option<AiEnrichment>,
  /// Set by the admin bulk-expire operation.
  pub expired_at:       Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Job {
  /// A job is expired once an admin expired it or its validity ran out.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expired_at.is_some() || self.valid_through.is_some_and(|v| v < now)
  }
}

/// Input to [`crate::store::JobStore::create_job`] and
/// [`crate::store::JobStore::update_job`]. Ids and timestamps are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
  pub external_id:      String,
  pub organization_id:  Uuid,
  pub title:            String,
  pub url:              Option<String>,
  pub date_posted:      Option<DateTime<Utc>>,
  pub date_created:     Option<DateTime<Utc>>,
  pub valid_through:    Option<DateTime<Utc>>,
  pub description:      Option<String>,
  pub location:         JobLocation,
  pub remote:           Option<bool>,
  pub employment_types: Vec<String>,
  pub salary_raw:       Option<serde_json::Value>,
  pub source:           JobSourceInfo,
  pub ai:               Option<AiEnrichment>,
}

impl NewJob {
  /// Convenience constructor with every optional field empty.
  pub fn new(
    external_id: impl Into<String>,
    organization_id: Uuid,
    title: impl Into<String>,
  ) -> Self {
    Self {
      external_id: external_id.into(),
      organization_id,
      title: title.into(),
      url: None,
      date_posted: None,
      date_created: None,
      valid_through: None,
      description: None,
      location: JobLocation::default(),
      remote: None,
      employment_types: Vec::new(),
      salary_raw: None,
      source: JobSourceInfo::default(),
      ai: None,
    }
  }
}
