//! Organizations: the companies jobs are posted by.
//!
//! An organization is created on the first sighting of a job that references
//! it and is afterwards only ever *enriched*: fields that are still empty may
//! be filled from later payloads, populated fields are never overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── LinkedIn profile ────────────────────────────────────────────────────────

/// Descriptive fields derived from the organization's LinkedIn page. All of
/// them are optional and treated as opaque by this system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedinProfile {
  pub industry:           Option<String>,
  /// Size bracket as reported upstream, e.g. `"51-200 employees"`.
  pub size:               Option<String>,
  pub employees:          Option<i64>,
  pub followers:          Option<i64>,
  pub headquarters:       Option<String>,
  pub org_type:           Option<String>,
  pub founded_date:       Option<String>,
  pub slogan:             Option<String>,
  pub description:        Option<String>,
  #[serde(default)]
  pub specialties:        Vec<String>,
  #[serde(default)]
  pub locations:          Vec<String>,
  pub recruitment_agency: Option<bool>,
}

// ─── Organization ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
  pub organization_id: Uuid,
  pub name:            String,
  pub url:             Option<String>,
  /// Bare lowercase host, e.g. `example.com`. See [`normalize_domain`].
  pub domain:          Option<String>,
  pub logo:            Option<String>,
  pub linkedin_slug:   Option<String>,
  pub linkedin_url:    Option<String>,
  pub linkedin:        LinkedinProfile,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input to [`crate::store::JobStore::create_organization`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOrganization {
  pub name:          String,
  pub url:           Option<String>,
  pub domain:        Option<String>,
  pub logo:          Option<String>,
  pub linkedin_slug: Option<String>,
  pub linkedin_url:  Option<String>,
  pub linkedin:      LinkedinProfile,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The key an organization is deduplicated by, in priority order.
///
/// The order must be applied the same way everywhere. Two payloads for the
/// same company can still resolve to different keys (one with a slug, one
/// without), which yields two rows; nothing reconciles them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrganizationKey {
  LinkedinSlug(String),
  Domain(String),
  Name(String),
}

impl OrganizationKey {
  /// Derive the key for an incoming organization.
  pub fn derive(org: &NewOrganization) -> Result<Self> {
    if let Some(slug) = non_blank(org.linkedin_slug.as_deref()) {
      return Ok(Self::LinkedinSlug(slug.to_lowercase()));
    }
    if let Some(domain) = org.domain.as_deref().and_then(normalize_domain) {
      return Ok(Self::Domain(domain));
    }
    let name = normalize_name(&org.name);
    if name.is_empty() {
      return Err(Error::MissingOrganizationName);
    }
    Ok(Self::Name(name))
  }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
  name
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Reduce a URL or host to a bare lowercase host without `www.`.
///
/// Returns `None` when nothing host-like remains.
pub fn normalize_domain(raw: &str) -> Option<String> {
  let s = raw.trim().to_lowercase();
  let s = s
    .strip_prefix("https://")
    .or_else(|| s.strip_prefix("http://"))
    .unwrap_or(&s);
  let host = s.split(['/', '?', '#']).next().unwrap_or_default();
  let host = host.split(':').next().unwrap_or_default();
  let host = host.strip_prefix("www.").unwrap_or(host);
  if host.is_empty() || !host.contains('.') {
    None
  } else {
    Some(host.to_owned())
  }
}

// ─── Enrichment merge ────────────────────────────────────────────────────────

/// Fields of an existing organization that a later sighting may fill in.
///
/// | Field          | Rule                                   |
/// |----------------|----------------------------------------|
/// | `logo`         | set only if currently `None`           |
/// | `linkedin_url` | set only if currently `None`           |
/// | `employees`    | set only if currently `None`           |
/// | `followers`    | set only if currently `None`           |
/// | `description`  | set only if currently `None`           |
///
/// Every other field is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationPatch {
  pub logo:         Option<String>,
  pub linkedin_url: Option<String>,
  pub employees:    Option<i64>,
  pub followers:    Option<i64>,
  pub description:  Option<String>,
}

impl OrganizationPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Apply the patch in memory. Fields that are already populated on `org`
  /// are left untouched even if the patch carries a value for them.
  pub fn apply_to(&self, org: &mut Organization) {
    fill(&mut org.logo, &self.logo);
    fill(&mut org.linkedin_url, &self.linkedin_url);
    fill(&mut org.linkedin.employees, &self.employees);
    fill(&mut org.linkedin.followers, &self.followers);
    fill(&mut org.linkedin.description, &self.description);
  }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
  if slot.is_none() {
    slot.clone_from(value);
  }
}

fn gap<T: Clone>(current: &Option<T>, incoming: &Option<T>) -> Option<T> {
  match current {
    Some(_) => None,
    None => incoming.clone(),
  }
}

/// Compute the fill-only patch that brings `existing` up to date with
/// `incoming`. Returns `None` when there is nothing to fill.
pub fn enrichment_patch(
  existing: &Organization,
  incoming: &NewOrganization,
) -> Option<OrganizationPatch> {
  let patch = OrganizationPatch {
    logo:         gap(&existing.logo, &incoming.logo),
    linkedin_url: gap(&existing.linkedin_url, &incoming.linkedin_url),
    employees:    gap(&existing.linkedin.employees, &incoming.linkedin.employees),
    followers:    gap(&existing.linkedin.followers, &incoming.linkedin.followers),
    description:  gap(
      &existing.linkedin.description,
      &incoming.linkedin.description,
    ),
  };
  (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn existing() -> Organization {
    let now = Utc::now();
    Organization {
      organization_id: Uuid::new_v4(),
      name:            "Acme".into(),
      url:             None,
      domain:          Some("acme.com".into()),
      logo:            Some("https://cdn/acme.png".into()),
      linkedin_slug:   None,
      linkedin_url:    None,
      linkedin:        LinkedinProfile::default(),
      created_at:      now,
      updated_at:      now,
    }
  }

  #[test]
  fn key_prefers_slug_then_domain_then_name() {
    let mut org = NewOrganization {
      name:          "  Acme   Corp ".into(),
      domain:        Some("https://www.Acme.com/careers".into()),
      linkedin_slug: Some("Acme-Corp".into()),
      ..Default::default()
    };
    assert_eq!(
      OrganizationKey::derive(&org).unwrap(),
      OrganizationKey::LinkedinSlug("acme-corp".into())
    );

    org.linkedin_slug = Some("   ".into());
    assert_eq!(
      OrganizationKey::derive(&org).unwrap(),
      OrganizationKey::Domain("acme.com".into())
    );

    org.domain = None;
    assert_eq!(
      OrganizationKey::derive(&org).unwrap(),
      OrganizationKey::Name("acme corp".into())
    );
  }

  #[test]
  fn key_requires_some_identity() {
    let org = NewOrganization { name: "   ".into(), ..Default::default() };
    assert!(matches!(
      OrganizationKey::derive(&org),
      Err(Error::MissingOrganizationName)
    ));
  }

  #[test]
  fn domain_normalization() {
    assert_eq!(normalize_domain("Example.COM").as_deref(), Some("example.com"));
    assert_eq!(
      normalize_domain("http://www.example.com:8080/jobs?x=1").as_deref(),
      Some("example.com")
    );
    assert_eq!(normalize_domain("localhost"), None);
    assert_eq!(normalize_domain(""), None);
  }

  #[test]
  fn patch_fills_only_gaps() {
    let org = existing();
    let incoming = NewOrganization {
      name:         "Acme".into(),
      logo:         Some("https://cdn/other.png".into()),
      linkedin_url: Some("https://linkedin.com/company/acme".into()),
      linkedin:     LinkedinProfile {
        employees: Some(120),
        industry: Some("Software".into()),
        ..Default::default()
      },
      ..Default::default()
    };

    let patch = enrichment_patch(&org, &incoming).expect("something to fill");
    assert_eq!(patch.logo, None, "populated logo must not be clobbered");
    assert_eq!(
      patch.linkedin_url.as_deref(),
      Some("https://linkedin.com/company/acme")
    );
    assert_eq!(patch.employees, Some(120));
    assert_eq!(patch.followers, None);
  }

  #[test]
  fn patch_is_none_when_nothing_new() {
    let org = existing();
    let incoming = NewOrganization {
      name: "Acme".into(),
      logo: Some("https://cdn/other.png".into()),
      ..Default::default()
    };
    assert!(enrichment_patch(&org, &incoming).is_none());
  }

  #[test]
  fn apply_never_overwrites() {
    let mut org = existing();
    let patch = OrganizationPatch {
      logo: Some("https://cdn/other.png".into()),
      followers: Some(10),
      ..Default::default()
    };
    patch.apply_to(&mut org);
    assert_eq!(org.logo.as_deref(), Some("https://cdn/acme.png"));
    assert_eq!(org.linkedin.followers, Some(10));
  }
}
