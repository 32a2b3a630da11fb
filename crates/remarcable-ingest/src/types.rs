//! Wire types for the upstream search API.
//!
//! Every field is optional on the wire; missing or `null` values decode to
//! `None` or an empty list. Unknown fields are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One job as returned by the `active-ats-*` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiJob {
  #[serde(deserialize_with = "id_as_string")]
  pub id:                Option<String>,
  pub title:             Option<String>,
  pub url:               Option<String>,
  pub date_posted:       Option<String>,
  pub date_created:      Option<String>,
  pub date_validthrough: Option<String>,
  pub description_text:  Option<String>,
  pub description_html:  Option<String>,

  // ── Organization ──────────────────────────────────────────────────────────
  pub organization:      Option<String>,
  pub organization_url:  Option<String>,
  pub organization_logo: Option<String>,
  pub domain_derived:    Option<String>,

  // ── Location ──────────────────────────────────────────────────────────────
  pub locations_raw:     Option<Value>,
  #[serde(deserialize_with = "null_as_empty")]
  pub cities_derived:    Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub counties_derived:  Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub regions_derived:   Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub countries_derived: Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub locations_derived: Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub timezones_derived: Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub lats_derived:      Vec<f64>,
  #[serde(deserialize_with = "null_as_empty")]
  pub lngs_derived:      Vec<f64>,
  pub remote_derived:    Option<bool>,

  // ── Employment and source ─────────────────────────────────────────────────
  #[serde(deserialize_with = "null_as_empty")]
  pub employment_type:   Vec<String>,
  pub salary_raw:        Option<Value>,
  pub source:            Option<String>,
  pub source_type:       Option<String>,
  pub source_domain:     Option<String>,

  // ── LinkedIn organization profile ─────────────────────────────────────────
  pub linkedin_org_slug:        Option<String>,
  pub linkedin_org_url:         Option<String>,
  pub linkedin_org_industry:    Option<String>,
  pub linkedin_org_size:        Option<String>,
  pub linkedin_org_employees:   Option<i64>,
  pub linkedin_org_followers:   Option<i64>,
  pub linkedin_org_headquarters: Option<String>,
  pub linkedin_org_type:        Option<String>,
  pub linkedin_org_foundeddate: Option<String>,
  pub linkedin_org_slogan:      Option<String>,
  pub linkedin_org_description: Option<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub linkedin_org_specialties: Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub linkedin_org_locations:   Vec<String>,
  pub linkedin_org_recruitment_agency_derived: Option<bool>,

  // ── AI enrichment ─────────────────────────────────────────────────────────
  pub ai_salary_currency:              Option<String>,
  pub ai_salary_value:                 Option<f64>,
  pub ai_salary_minvalue:              Option<f64>,
  pub ai_salary_maxvalue:              Option<f64>,
  pub ai_salary_unittext:              Option<String>,
  pub ai_experience_level:             Option<String>,
  pub ai_work_arrangement:             Option<String>,
  pub ai_work_arrangement_office_days: Option<f64>,
  #[serde(deserialize_with = "null_as_empty")]
  pub ai_remote_location:              Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub ai_key_skills:                   Vec<String>,
  pub ai_core_responsibilities:        Option<String>,
  pub ai_requirements_summary:         Option<String>,
  pub ai_working_hours:                Option<f64>,
  #[serde(deserialize_with = "null_as_empty")]
  pub ai_employment_type:              Vec<String>,
  pub ai_job_language:                 Option<String>,
  pub ai_visa_sponsorship:             Option<bool>,
  pub ai_hiring_manager_name:          Option<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub ai_benefits:                     Vec<String>,
  #[serde(deserialize_with = "null_as_empty")]
  pub ai_taxonomies_a:                 Vec<String>,
}

/// Upstream ids arrive as numbers or strings depending on the endpoint.
fn id_as_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(de)? {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

fn null_as_empty<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn numeric_ids_become_strings() {
    let job: ApiJob = serde_json::from_value(json!({ "id": 1234567, "title": "x" })).unwrap();
    assert_eq!(job.id.as_deref(), Some("1234567"));

    let job: ApiJob = serde_json::from_value(json!({ "id": "abc" })).unwrap();
    assert_eq!(job.id.as_deref(), Some("abc"));
  }

  #[test]
  fn null_lists_decode_empty() {
    let job: ApiJob = serde_json::from_value(json!({
      "id": 1,
      "cities_derived": null,
      "countries_derived": ["Germany"],
      "unexpected": { "nested": true },
    }))
    .unwrap();
    assert!(job.cities_derived.is_empty());
    assert_eq!(job.countries_derived, vec!["Germany".to_owned()]);
  }
}
