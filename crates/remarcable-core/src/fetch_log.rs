//! Fetch logs: the immutable audit trail of ingestion runs.
//!
//! Exactly one log is written per fetch attempt, including failed ones. Logs
//! are never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Outcome of a fetch run.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FetchStatus {
  /// Every item was processed.
  Success,
  /// The run completed but at least one item failed.
  Partial,
  /// The run itself failed (upstream error, bad response shape, …).
  Error,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCounts {
  pub jobs_fetched:  u32,
  pub jobs_created:  u32,
  pub jobs_updated:  u32,
  pub orgs_created:  u32,
  pub orgs_updated:  u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLog {
  pub fetch_log_id:   Uuid,
  pub status:         FetchStatus,
  #[serde(flatten)]
  pub counts:         FetchCounts,
  /// The parameter map the run was issued with.
  pub params:         serde_json::Value,
  pub error_message:  Option<String>,
  pub duration_ms:    u64,
  pub saved_query_id: Option<Uuid>,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::JobStore::record_fetch_log`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewFetchLog {
  pub status:         FetchStatus,
  pub counts:         FetchCounts,
  pub params:         serde_json::Value,
  pub error_message:  Option<String>,
  pub duration_ms:    u64,
  pub saved_query_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn status_strings_match_serde() {
    for status in [FetchStatus::Success, FetchStatus::Partial, FetchStatus::Error] {
      let via_serde = serde_json::to_value(status).unwrap();
      assert_eq!(via_serde.as_str(), Some(status.as_ref()));
      assert_eq!(FetchStatus::from_str(status.as_ref()).unwrap(), status);
    }
  }
}
