//! Saved queries: persisted `QueryBuilder` parameter sets an admin can
//! re-run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
  pub saved_query_id: Uuid,
  pub name:           String,
  pub description:    Option<String>,
  /// JSON form of the query builder; see `QueryBuilder::to_json`.
  pub params:         serde_json::Value,
  pub last_run_at:    Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSavedQuery {
  pub name:        String,
  pub description: Option<String>,
  pub params:      serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedQueryUpdate {
  pub name:        Option<String>,
  pub description: Option<Option<String>>,
  pub params:      Option<serde_json::Value>,
}
