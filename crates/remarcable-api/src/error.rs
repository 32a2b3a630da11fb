//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": "<message>"}`. Validation errors add a
//! `details` array of `{field, message}` objects.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use remarcable_ingest::{ClientError, FetchError, QueryError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing, unknown or expired bearer token.
  #[error("invalid or missing API token")]
  InvalidToken,

  /// Missing or expired admin session.
  #[error("authentication required")]
  Unauthenticated,

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("admin access required")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("upstream returned {status}: {message}")]
  Upstream { status: u16, message: String },

  #[error("{0} is not configured")]
  NotConfigured(&'static str),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a store or other unexpected failure.
  pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(err))
  }

  pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::InvalidToken | Self::Unauthenticated | Self::InvalidCredentials => {
        StatusCode::UNAUTHORIZED
      }
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Upstream { status, .. } => {
        StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
      }
      Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<QueryError> for ApiError {
  fn from(err: QueryError) -> Self {
    let field = err.key().map_or_else(|| "params".to_owned(), |k| format!("params.{k}"));
    Self::field(field, err.to_string())
  }
}

impl From<FetchError> for ApiError {
  fn from(err: FetchError) -> Self {
    match err {
      FetchError::Client(ClientError::Status { status, message }) => {
        Self::Upstream { status, message }
      }
      FetchError::Client(ClientError::MissingConfig(key)) => Self::NotConfigured(key),
      other => Self::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Validation(details) => {
        json!({ "error": "validation failed", "details": details })
      }
      ApiError::BadRequest(m) | ApiError::NotFound(m) | ApiError::Conflict(m) => {
        json!({ "error": m })
      }
      ApiError::Upstream { message, .. } => json!({ "error": message }),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        json!({ "error": "internal server error" })
      }
      ApiError::NotConfigured(_) => {
        tracing::error!(error = %self, "request needs missing configuration");
        json!({ "error": self.to_string() })
      }
      other => json!({ "error": other.to_string() }),
    };

    let mut res = (status, Json(body)).into_response();
    if matches!(self, ApiError::InvalidToken) {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn validation_lists_fields() {
    let res = ApiError::Validation(vec![FieldError::new("slug", "must be lowercase")])
      .into_response();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body(res).await;
    assert_eq!(json["details"][0]["field"], "slug");
    assert_eq!(json["details"][0]["message"], "must be lowercase");
  }

  #[tokio::test]
  async fn invalid_token_challenges_bearer() {
    let res = ApiError::InvalidToken.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }

  #[tokio::test]
  async fn internal_errors_are_opaque() {
    let err = std::io::Error::other("disk on fire");
    let res = ApiError::internal(err).into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(res).await["error"], "internal server error");
  }

  #[test]
  fn upstream_statuses_are_relayed() {
    let rate_limited = ApiError::from(FetchError::Client(ClientError::Status {
      status:  429,
      message: "slow down".into(),
    }));
    assert_eq!(rate_limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let forbidden = ApiError::from(FetchError::Client(ClientError::Status {
      status:  403,
      message: "not subscribed".into(),
    }));
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    assert_eq!(
      ApiError::from(FetchError::InvalidResponse).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn query_errors_point_at_the_param() {
    let err = ApiError::from(QueryError::UnknownKey("colour".into()));
    match err {
      ApiError::Validation(details) => assert_eq!(details[0].field, "params.colour"),
      other => panic!("unexpected error: {other:?}"),
    }
  }
}
