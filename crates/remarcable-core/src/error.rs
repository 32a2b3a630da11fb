//! Error types for `remarcable-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("organization has no usable name")]
  MissingOrganizationName,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
