//! CORS policy: an explicit origin allowlist with credentials, so browser
//! front-ends can send the admin session cookie.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::Error;

const MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, Error> {
  let origins = origins
    .iter()
    .map(|o| {
      HeaderValue::from_str(o.trim().trim_end_matches('/'))
        .map_err(|_| Error::InvalidOrigin(o.clone()))
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods([
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
      ])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
      .allow_credentials(true)
      .max_age(MAX_AGE),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_unencodable_origins() {
    let err = cors_layer(&["https://ok.example".into(), "bad\norigin".into()]).unwrap_err();
    assert!(matches!(err, Error::InvalidOrigin(o) if o == "bad\norigin"));
  }
}
