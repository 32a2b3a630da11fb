//! Errors raised while assembling the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid CORS origin: {0:?}")]
  InvalidOrigin(String),

  #[error("invalid rate limit: {0}")]
  RateLimit(&'static str),

  #[error("upstream client: {0}")]
  Upstream(#[from] remarcable_ingest::ClientError),
}
