//! Conversion from upstream payloads to store inputs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use remarcable_core::{
  job::{AiEnrichment, JobLocation, JobSourceInfo, NewJob},
  organization::{LinkedinProfile, NewOrganization, normalize_domain},
};
use uuid::Uuid;

use crate::{error::FetchError, types::ApiJob};

fn clean(s: &Option<String>) -> Option<String> {
  s.as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

/// Parse the date formats seen upstream: RFC 3339, naive date-times (taken as
/// UTC) and bare dates. Anything else is dropped.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
    return Some(naive.and_utc());
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
  }
  tracing::debug!(raw, "unparseable upstream date");
  None
}

fn date(s: &Option<String>) -> Option<DateTime<Utc>> {
  s.as_deref().and_then(parse_date)
}

/// The organization described by a job payload.
///
/// A blank name falls back to the LinkedIn slug, then the domain. With none
/// of the three the name stays empty and key derivation rejects the item.
pub fn organization(api: &ApiJob) -> NewOrganization {
  let domain = api
    .domain_derived
    .as_deref()
    .and_then(normalize_domain)
    .or_else(|| api.organization_url.as_deref().and_then(normalize_domain));
  let linkedin_slug = clean(&api.linkedin_org_slug);
  let name = clean(&api.organization)
    .or_else(|| linkedin_slug.clone())
    .or_else(|| domain.clone())
    .unwrap_or_default();

  NewOrganization {
    name,
    url: clean(&api.organization_url),
    domain,
    logo: clean(&api.organization_logo),
    linkedin_slug,
    linkedin_url: clean(&api.linkedin_org_url),
    linkedin: LinkedinProfile {
      industry:           clean(&api.linkedin_org_industry),
      size:               clean(&api.linkedin_org_size),
      employees:          api.linkedin_org_employees,
      followers:          api.linkedin_org_followers,
      headquarters:       clean(&api.linkedin_org_headquarters),
      org_type:           clean(&api.linkedin_org_type),
      founded_date:       clean(&api.linkedin_org_foundeddate),
      slogan:             clean(&api.linkedin_org_slogan),
      description:        clean(&api.linkedin_org_description),
      specialties:        api.linkedin_org_specialties.clone(),
      locations:          api.linkedin_org_locations.clone(),
      recruitment_agency: api.linkedin_org_recruitment_agency_derived,
    },
  }
}

/// The job described by a payload, attached to `organization_id`.
pub fn job(api: &ApiJob, organization_id: Uuid) -> Result<NewJob, FetchError> {
  let external_id = clean(&api.id).ok_or(FetchError::MissingJobId)?;

  let ai = AiEnrichment {
    salary_currency:       clean(&api.ai_salary_currency),
    salary_value:          api.ai_salary_value,
    salary_min:            api.ai_salary_minvalue,
    salary_max:            api.ai_salary_maxvalue,
    salary_unit:           clean(&api.ai_salary_unittext),
    experience_level:      clean(&api.ai_experience_level),
    work_arrangement:      clean(&api.ai_work_arrangement),
    office_days:           api.ai_work_arrangement_office_days,
    remote_location:       api.ai_remote_location.clone(),
    key_skills:            api.ai_key_skills.clone(),
    core_responsibilities: clean(&api.ai_core_responsibilities),
    requirements_summary:  clean(&api.ai_requirements_summary),
    working_hours:         api.ai_working_hours,
    employment_types:      api.ai_employment_type.clone(),
    job_language:          clean(&api.ai_job_language),
    visa_sponsorship:      api.ai_visa_sponsorship,
    hiring_manager_name:   clean(&api.ai_hiring_manager_name),
    benefits:              api.ai_benefits.clone(),
    taxonomies:            api.ai_taxonomies_a.clone(),
  };

  Ok(NewJob {
    external_id,
    organization_id,
    title: clean(&api.title).unwrap_or_default(),
    url: clean(&api.url),
    date_posted: date(&api.date_posted),
    date_created: date(&api.date_created),
    valid_through: date(&api.date_validthrough),
    description: clean(&api.description_text).or_else(|| clean(&api.description_html)),
    location: JobLocation {
      cities:     api.cities_derived.clone(),
      counties:   api.counties_derived.clone(),
      regions:    api.regions_derived.clone(),
      countries:  api.countries_derived.clone(),
      locations:  api.locations_derived.clone(),
      timezones:  api.timezones_derived.clone(),
      latitudes:  api.lats_derived.clone(),
      longitudes: api.lngs_derived.clone(),
      raw:        api.locations_raw.clone(),
    },
    remote: api.remote_derived,
    employment_types: api.employment_type.clone(),
    salary_raw: api.salary_raw.clone(),
    source: JobSourceInfo {
      source:        clean(&api.source),
      source_type:   clean(&api.source_type),
      source_domain: clean(&api.source_domain),
    },
    ai: (!ai.is_empty()).then_some(ai),
  })
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};
  use serde_json::json;

  use super::*;

  fn payload() -> ApiJob {
    serde_json::from_value(json!({
      "id": 1873201,
      "title": "  Senior Rust Engineer ",
      "organization": "Acme",
      "organization_url": "https://www.Acme.io/careers",
      "date_posted": "2025-03-01T09:30:00",
      "date_validthrough": "2025-04-01",
      "countries_derived": ["Germany"],
      "remote_derived": true,
      "linkedin_org_slug": "acme",
      "linkedin_org_employees": 120,
      "ai_key_skills": ["Rust", "Tokio"],
    }))
    .unwrap()
  }

  #[test]
  fn organization_fields() {
    let org = organization(&payload());
    assert_eq!(org.name, "Acme");
    assert_eq!(org.domain.as_deref(), Some("acme.io"));
    assert_eq!(org.linkedin_slug.as_deref(), Some("acme"));
    assert_eq!(org.linkedin.employees, Some(120));
  }

  #[test]
  fn blank_name_falls_back_to_slug_then_domain() {
    let with_slug: ApiJob = serde_json::from_value(json!({
      "organization": "   ",
      "linkedin_org_slug": "acme-inc",
      "domain_derived": "acme.com",
    }))
    .unwrap();
    assert_eq!(organization(&with_slug).name, "acme-inc");

    let domain_only: ApiJob = serde_json::from_value(json!({
      "organization_url": "https://www.acme.com/jobs",
    }))
    .unwrap();
    assert_eq!(organization(&domain_only).name, "acme.com");

    let nothing: ApiJob = serde_json::from_value(json!({ "id": "9" })).unwrap();
    assert_eq!(organization(&nothing).name, "");
  }

  #[test]
  fn job_fields() {
    let org_id = Uuid::new_v4();
    let job = job(&payload(), org_id).unwrap();
    assert_eq!(job.external_id, "1873201");
    assert_eq!(job.title, "Senior Rust Engineer");
    assert_eq!(job.organization_id, org_id);
    assert_eq!(job.remote, Some(true));
    assert_eq!(job.location.countries, vec!["Germany".to_owned()]);
    assert_eq!(job.ai.unwrap().key_skills, vec!["Rust".to_owned(), "Tokio".to_owned()]);

    let posted = job.date_posted.unwrap();
    assert_eq!((posted.hour(), posted.minute()), (9, 30));
    assert_eq!(job.valid_through.unwrap().day(), 1);
  }

  #[test]
  fn job_without_ai_fields_has_no_enrichment() {
    let api: ApiJob = serde_json::from_value(json!({ "id": "x", "title": "t" })).unwrap();
    assert!(job(&api, Uuid::new_v4()).unwrap().ai.is_none());
  }

  #[test]
  fn job_without_id_is_rejected() {
    let api: ApiJob = serde_json::from_value(json!({ "title": "t" })).unwrap();
    assert!(matches!(job(&api, Uuid::new_v4()), Err(FetchError::MissingJobId)));
  }

  #[test]
  fn date_formats() {
    assert!(parse_date("2025-03-01T09:30:00Z").is_some());
    assert!(parse_date("2025-03-01T09:30:00.123").is_some());
    assert!(parse_date("2025-03-01").is_some());
    assert!(parse_date("last tuesday").is_none());
  }
}
