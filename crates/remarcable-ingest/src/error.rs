//! Error types for `remarcable-ingest`.

use thiserror::Error;

/// Failure of an outbound call to the upstream search API.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("missing configuration value: {0}")]
  MissingConfig(&'static str),

  #[error("invalid upstream base URL: {0:?}")]
  InvalidBaseUrl(String),

  #[error("upstream request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("upstream returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("upstream response is not valid JSON: {0}")]
  Decode(#[from] serde_json::Error),
}

impl ClientError {
  /// The upstream HTTP status, when the upstream answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// A query parameter set that could not be accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
  #[error("query must be a JSON object")]
  NotAnObject,

  #[error("unknown query parameter: {0}")]
  UnknownKey(String),

  #[error("invalid value for {key}: {reason}")]
  InvalidValue { key: String, reason: String },
}

impl QueryError {
  pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
    Self::InvalidValue { key: key.to_owned(), reason: reason.into() }
  }

  /// The offending parameter, if the error concerns one.
  pub fn key(&self) -> Option<&str> {
    match self {
      Self::NotAnObject => None,
      Self::UnknownKey(key) | Self::InvalidValue { key, .. } => Some(key),
    }
  }
}

/// Failure of a fetch run or of one item inside it.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error(transparent)]
  Client(#[from] ClientError),

  #[error("invalid response format: expected a JSON array of jobs")]
  InvalidResponse,

  #[error("malformed job payload: {0}")]
  Payload(#[from] serde_json::Error),

  #[error("job payload has no id")]
  MissingJobId,

  #[error(transparent)]
  Core(#[from] remarcable_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
  pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}
