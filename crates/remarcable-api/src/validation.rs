//! Request decoding and input checks.
//!
//! [`ValidJson`] and [`ValidQuery`] replace axum's `Json` and `Query` so that
//! malformed input produces the same `400 {error, details}` body as a failed
//! field check.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Query, Request},
  http::request::Parts,
};
use remarcable_core::board::is_valid_slug;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::{ApiError, FieldError};

/// Upper bound on the ids accepted by one bulk operation.
pub const MAX_BULK_IDS: usize = 1000;

pub const MAX_NAME_LEN: usize = 200;

// ─── Extractors ──────────────────────────────────────────────────────────────

/// A JSON body that failed to decode is reported against the `body` field.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(ValidJson(value)),
      Err(rejection) => Err(ApiError::field("body", rejection.body_text())),
    }
  }
}

/// A query string that failed to decode is reported against the `query`
/// field.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    match Query::<T>::from_request_parts(parts, state).await {
      Ok(Query(value)) => Ok(ValidQuery(value)),
      Err(rejection) => Err(ApiError::field("query", rejection.body_text())),
    }
  }
}

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

// ─── Field checks ────────────────────────────────────────────────────────────

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Checks {
  errors: Vec<FieldError>,
}

impl Checks {
  pub fn new() -> Self { Self::default() }

  pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
    if !ok {
      self.errors.push(FieldError::new(field, message));
    }
    self
  }

  pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
    let value = value.trim();
    self.check(!value.is_empty(), field, "must not be blank").check(
      value.chars().count() <= MAX_NAME_LEN,
      field,
      "is too long",
    )
  }

  pub fn slug(&mut self, field: &str, value: &str) -> &mut Self {
    self.check(
      is_valid_slug(value),
      field,
      "must be lowercase letters, digits and single hyphens",
    )
  }

  pub fn ids(&mut self, field: &str, ids: &[Uuid]) -> &mut Self {
    self
      .check(!ids.is_empty(), field, "must not be empty")
      .check(ids.len() <= MAX_BULK_IDS, field, "too many ids")
  }

  pub fn finish(&mut self) -> Result<(), ApiError> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(ApiError::Validation(std::mem::take(&mut self.errors)))
    }
  }
}

/// Trim and drop blank optional text.
pub fn clean(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

/// Deduplicate ids, keeping first-seen order.
pub fn unique_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
  let mut seen = std::collections::HashSet::new();
  ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
