//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so they compare correctly as text. List and opaque
//! fields are stored as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use remarcable_core::{
  access::{ApiToken, Session, User},
  board::JobBoard,
  fetch_log::{FetchCounts, FetchLog, FetchStatus},
  job::{Job, JobSourceInfo},
  organization::Organization,
  saved_query::SavedQuery,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_uuids(ids: &[Uuid]) -> Vec<String> {
  ids.iter().copied().map(encode_uuid).collect()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_opt_dt(dt: Option<DateTime<Utc>>) -> Option<String> {
  dt.map(encode_dt)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

pub fn decode_opt_json<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>> {
  s.map(decode_json).transpose()
}

// ─── FetchStatus ──────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<FetchStatus> {
  FetchStatus::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown fetch status: {s:?}")))
}

fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("count out of range: {n}")))
}

// ─── Column lists ─────────────────────────────────────────────────────────────

pub const ORG_COLUMNS: &str = "organization_id, name, url, domain, logo, \
  linkedin_slug, linkedin_url, linkedin_json, created_at, updated_at";

pub const JOB_COLUMNS: &str = "job_id, external_id, organization_id, title, \
  url, date_posted, date_created, valid_through, description, location_json, \
  remote, employment_types, salary_raw, source, source_type, source_domain, \
  ai_json, expired_at, created_at, updated_at";

pub const BOARD_COLUMNS: &str =
  "board_id, name, slug, description, is_public, created_at, updated_at";

pub const FETCH_LOG_COLUMNS: &str = "fetch_log_id, status, jobs_fetched, \
  jobs_created, jobs_updated, orgs_created, orgs_updated, params_json, \
  error_message, duration_ms, saved_query_id, created_at";

pub const SAVED_QUERY_COLUMNS: &str = "saved_query_id, name, description, \
  params_json, last_run_at, created_at, updated_at";

pub const TOKEN_COLUMNS: &str =
  "token_id, name, token_hash, expires_at, last_used_at, created_at";

pub const USER_COLUMNS: &str =
  "user_id, email, password_hash, is_admin, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `organizations` row.
pub struct RawOrganization {
  pub organization_id: String,
  pub name:            String,
  pub url:             Option<String>,
  pub domain:          Option<String>,
  pub logo:            Option<String>,
  pub linkedin_slug:   Option<String>,
  pub linkedin_url:    Option<String>,
  pub linkedin_json:   String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawOrganization {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      organization_id: row.get(0)?,
      name:            row.get(1)?,
      url:             row.get(2)?,
      domain:          row.get(3)?,
      logo:            row.get(4)?,
      linkedin_slug:   row.get(5)?,
      linkedin_url:    row.get(6)?,
      linkedin_json:   row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
    })
  }

  pub fn into_organization(self) -> Result<Organization> {
    Ok(Organization {
      organization_id: decode_uuid(&self.organization_id)?,
      name:            self.name,
      url:             self.url,
      domain:          self.domain,
      logo:            self.logo,
      linkedin_slug:   self.linkedin_slug,
      linkedin_url:    self.linkedin_url,
      linkedin:        decode_json(&self.linkedin_json)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `jobs` row.
pub struct RawJob {
  pub job_id:           String,
  pub external_id:      String,
  pub organization_id:  String,
  pub title:            String,
  pub url:              Option<String>,
  pub date_posted:      Option<String>,
  pub date_created:     Option<String>,
  pub valid_through:    Option<String>,
  pub description:      Option<String>,
  pub location_json:    String,
  pub remote:           Option<bool>,
  pub employment_types: String,
  pub salary_raw:       Option<String>,
  pub source:           Option<String>,
  pub source_type:      Option<String>,
  pub source_domain:    Option<String>,
  pub ai_json:          Option<String>,
  pub expired_at:       Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawJob {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      job_id:           row.get(0)?,
      external_id:      row.get(1)?,
      organization_id:  row.get(2)?,
      title:            row.get(3)?,
      url:              row.get(4)?,
      date_posted:      row.get(5)?,
      date_created:     row.get(6)?,
      valid_through:    row.get(7)?,
      description:      row.get(8)?,
      location_json:    row.get(9)?,
      remote:           row.get(10)?,
      employment_types: row.get(11)?,
      salary_raw:       row.get(12)?,
      source:           row.get(13)?,
      source_type:      row.get(14)?,
      source_domain:    row.get(15)?,
      ai_json:          row.get(16)?,
      expired_at:       row.get(17)?,
      created_at:       row.get(18)?,
      updated_at:       row.get(19)?,
    })
  }

  pub fn into_job(self) -> Result<Job> {
    Ok(Job {
      job_id:           decode_uuid(&self.job_id)?,
      external_id:      self.external_id,
      organization_id:  decode_uuid(&self.organization_id)?,
      title:            self.title,
      url:              self.url,
      date_posted:      decode_opt_dt(self.date_posted.as_deref())?,
      date_created:     decode_opt_dt(self.date_created.as_deref())?,
      valid_through:    decode_opt_dt(self.valid_through.as_deref())?,
      description:      self.description,
      location:         decode_json(&self.location_json)?,
      remote:           self.remote,
      employment_types: decode_json(&self.employment_types)?,
      salary_raw:       decode_opt_json(self.salary_raw.as_deref())?,
      source:           JobSourceInfo {
        source:        self.source,
        source_type:   self.source_type,
        source_domain: self.source_domain,
      },
      ai:               decode_opt_json(self.ai_json.as_deref())?,
      expired_at:       decode_opt_dt(self.expired_at.as_deref())?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `job_boards` row.
pub struct RawBoard {
  pub board_id:    String,
  pub name:        String,
  pub slug:        String,
  pub description: Option<String>,
  pub is_public:   bool,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawBoard {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      board_id:    row.get(0)?,
      name:        row.get(1)?,
      slug:        row.get(2)?,
      description: row.get(3)?,
      is_public:   row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_board(self) -> Result<JobBoard> {
    Ok(JobBoard {
      board_id:    decode_uuid(&self.board_id)?,
      name:        self.name,
      slug:        self.slug,
      description: self.description,
      is_public:   self.is_public,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `fetch_logs` row.
pub struct RawFetchLog {
  pub fetch_log_id:   String,
  pub status:         String,
  pub jobs_fetched:   i64,
  pub jobs_created:   i64,
  pub jobs_updated:   i64,
  pub orgs_created:   i64,
  pub orgs_updated:   i64,
  pub params_json:    String,
  pub error_message:  Option<String>,
  pub duration_ms:    i64,
  pub saved_query_id: Option<String>,
  pub created_at:     String,
}

impl RawFetchLog {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fetch_log_id:   row.get(0)?,
      status:         row.get(1)?,
      jobs_fetched:   row.get(2)?,
      jobs_created:   row.get(3)?,
      jobs_updated:   row.get(4)?,
      orgs_created:   row.get(5)?,
      orgs_updated:   row.get(6)?,
      params_json:    row.get(7)?,
      error_message:  row.get(8)?,
      duration_ms:    row.get(9)?,
      saved_query_id: row.get(10)?,
      created_at:     row.get(11)?,
    })
  }

  pub fn into_fetch_log(self) -> Result<FetchLog> {
    Ok(FetchLog {
      fetch_log_id:   decode_uuid(&self.fetch_log_id)?,
      status:         decode_status(&self.status)?,
      counts:         FetchCounts {
        jobs_fetched: decode_count(self.jobs_fetched)?,
        jobs_created: decode_count(self.jobs_created)?,
        jobs_updated: decode_count(self.jobs_updated)?,
        orgs_created: decode_count(self.orgs_created)?,
        orgs_updated: decode_count(self.orgs_updated)?,
      },
      params:         decode_json(&self.params_json)?,
      error_message:  self.error_message,
      duration_ms:    u64::try_from(self.duration_ms).unwrap_or_default(),
      saved_query_id: self.saved_query_id.as_deref().map(decode_uuid).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `saved_queries` row.
pub struct RawSavedQuery {
  pub saved_query_id: String,
  pub name:           String,
  pub description:    Option<String>,
  pub params_json:    String,
  pub last_run_at:    Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawSavedQuery {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      saved_query_id: row.get(0)?,
      name:           row.get(1)?,
      description:    row.get(2)?,
      params_json:    row.get(3)?,
      last_run_at:    row.get(4)?,
      created_at:     row.get(5)?,
      updated_at:     row.get(6)?,
    })
  }

  pub fn into_saved_query(self) -> Result<SavedQuery> {
    Ok(SavedQuery {
      saved_query_id: decode_uuid(&self.saved_query_id)?,
      name:           self.name,
      description:    self.description,
      params:         decode_json(&self.params_json)?,
      last_run_at:    decode_opt_dt(self.last_run_at.as_deref())?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `api_tokens` row.
pub struct RawApiToken {
  pub token_id:     String,
  pub name:         String,
  pub token_hash:   String,
  pub expires_at:   Option<String>,
  pub last_used_at: Option<String>,
  pub created_at:   String,
}

impl RawApiToken {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      token_id:     row.get(0)?,
      name:         row.get(1)?,
      token_hash:   row.get(2)?,
      expires_at:   row.get(3)?,
      last_used_at: row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_token(self) -> Result<ApiToken> {
    Ok(ApiToken {
      token_id:     decode_uuid(&self.token_id)?,
      name:         self.name,
      token_hash:   self.token_hash,
      expires_at:   decode_opt_dt(self.expires_at.as_deref())?,
      last_used_at: decode_opt_dt(self.last_used_at.as_deref())?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `users` row, starting at `offset`.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(offset)?,
      email:         row.get(offset + 1)?,
      password_hash: row.get(offset + 2)?,
      is_admin:      row.get(offset + 3)?,
      created_at:    row.get(offset + 4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      is_admin:      self.is_admin,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: String,
  pub user_id:    String,
  pub token_hash: String,
  pub expires_at: String,
  pub created_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id: decode_uuid(&self.session_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      token_hash: self.token_hash,
      expires_at: decode_dt(&self.expires_at)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let a = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&ea).unwrap(), a);
  }

  #[test]
  fn unknown_status_is_rejected() {
    assert!(matches!(decode_status("pending"), Err(Error::Decode(_))));
    assert_eq!(decode_status("partial").unwrap(), FetchStatus::Partial);
  }
}
