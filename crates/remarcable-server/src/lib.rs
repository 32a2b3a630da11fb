//! HTTP server assembly for the Remarcable job board.
//!
//! Wraps the `remarcable-api` routers with the process-level concerns:
//! configuration, CORS, per-IP rate limiting on `/api/v1`, and request
//! tracing.

pub mod cors;
pub mod error;
pub mod rate_limit;
pub mod settings;

pub use settings::ServerConfig;
pub use error::Error;

use axum::{Router, routing::get};
use remarcable_api::{AppState, admin_router, auth_router, v1_router};
use remarcable_core::store::JobStore;
use remarcable_ingest::{ClientConfig, FantasticJobsClient};
use tower_http::trace::TraceLayer;
use tracing::warn;

// ─── Application state ────────────────────────────────────────────────────────

/// Build handler state for `store` from `config`.
///
/// A blank upstream API key leaves the fetch endpoints unconfigured.
pub fn app_state<S>(store: S, config: &ServerConfig) -> Result<AppState<S>, Error> {
  let state = AppState::new(store)
    .with_session_ttl(chrono::Duration::hours(config.session_ttl_hours))
    .with_secure_cookies(config.secure_cookies);

  let upstream = &config.fantastic_jobs;
  if upstream.api_key.trim().is_empty() {
    warn!("no fantastic-jobs API key configured; fetch endpoints are disabled");
    return Ok(state);
  }
  let client = FantasticJobsClient::new(ClientConfig {
    timeout: std::time::Duration::from_secs(upstream.timeout_secs),
    ..ClientConfig::new(upstream.api_key.clone(), upstream.api_host.clone())
  })?;
  Ok(state.with_source(client))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application router. Must be called within a Tokio runtime.
pub fn router<S>(state: AppState<S>, config: &ServerConfig) -> Result<Router, Error>
where
  S: JobStore + 'static,
{
  let v1 = rate_limit::limit_by_ip(v1_router(state.clone()), &config.rate_limit)?;

  Ok(
    Router::new()
      .route("/health", get(|| async { "ok" }))
      .nest("/api/v1", v1)
      .nest("/api/admin", admin_router(state.clone()))
      .nest("/api/auth", auth_router(state))
      .layer(cors::cors_layer(&config.cors_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use remarcable_store_sqlite::SqliteStore;
  use settings::RateLimitConfig;
  use tower::ServiceExt as _;

  fn test_config(requests: u32) -> ServerConfig {
    ServerConfig {
      rate_limit: RateLimitConfig { requests, window_secs: 60 },
      ..ServerConfig::default()
    }
  }

  async fn make_router(requests: u32) -> Router {
    let cfg = test_config(requests);
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(app_state(store, &cfg).unwrap(), &cfg).unwrap()
  }

  async fn oneshot_raw(
    app: &Router,
    method: &str,
    uri: &str,
    headers: Vec<(header::HeaderName, &str)>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  #[tokio::test]
  async fn health_is_open() {
    let app = make_router(1).await;
    let resp = oneshot_raw(&app, "GET", "/health", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn preflight_from_allowed_origin() {
    let app = make_router(100).await;
    let resp = oneshot_raw(
      &app,
      "OPTIONS",
      "/api/v1/jobs",
      vec![
        (header::ORIGIN, "https://remarcablejobs.com"),
        (header::ACCESS_CONTROL_REQUEST_METHOD, "GET"),
        (header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"),
      ],
    )
    .await;
    assert!(resp.status().is_success());
    assert_eq!(
      resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
      "https://remarcablejobs.com"
    );
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
  }

  #[tokio::test]
  async fn unknown_origin_gets_no_cors_headers() {
    let app = make_router(100).await;
    let resp = oneshot_raw(
      &app,
      "GET",
      "/health",
      vec![(header::ORIGIN, "https://evil.example")],
    )
    .await;
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[tokio::test]
  async fn v1_is_rate_limited_per_ip() {
    let app = make_router(2).await;
    let from = |ip: &'static str| vec![(header::HeaderName::from_static("x-forwarded-for"), ip)];

    for _ in 0..2 {
      let resp = oneshot_raw(&app, "GET", "/api/v1/stats", from("203.0.113.7")).await;
      // Unauthenticated, but counted.
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
      assert!(resp.headers().contains_key("x-ratelimit-remaining"));
    }
    let resp = oneshot_raw(&app, "GET", "/api/v1/stats", from("203.0.113.7")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry: u64 = resp.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry));
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

    let resp = oneshot_raw(&app, "GET", "/api/v1/stats", from("203.0.113.8")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn admin_routes_are_not_rate_limited() {
    let app = make_router(1).await;
    for _ in 0..3 {
      let resp = oneshot_raw(&app, "GET", "/api/admin/boards", vec![]).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
  }

  #[tokio::test]
  async fn zero_request_quota_is_a_config_error() {
    let cfg = test_config(0);
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = app_state(store, &cfg).unwrap();
    assert!(matches!(router(state, &cfg), Err(Error::RateLimit(_))));
  }

  #[tokio::test]
  async fn blank_api_key_leaves_fetch_unconfigured() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = app_state(store, &ServerConfig::default()).unwrap();
    assert!(state.source.is_none());
  }
}
