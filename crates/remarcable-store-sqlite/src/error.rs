//! Error type for `remarcable-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] remarcable_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid column value: {0}")]
  Decode(String),

  #[error("organization not found: {0}")]
  OrganizationNotFound(uuid::Uuid),

  #[error("job not found: {0}")]
  JobNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
