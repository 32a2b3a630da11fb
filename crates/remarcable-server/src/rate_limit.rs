//! Per-IP rate limiting for `/api/v1`, backed by `tower_governor`.
//!
//! Counters live in this process only; several instances behind a load
//! balancer each enforce their own limit. The client address comes from
//! `X-Forwarded-For`, then `X-Real-IP`, then the socket.

use std::time::Duration;

use axum::{
  Json, Router,
  http::{HeaderValue, StatusCode, header},
  middleware,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tower_governor::{
  GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tracing::{debug, warn};

use crate::{Error, settings::RateLimitConfig};

/// How often idle per-IP state is dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Replenish interval for one request slot: the window spread over the quota.
pub fn replenish_period(config: &RateLimitConfig) -> Result<Duration, Error> {
  if config.requests == 0 {
    return Err(Error::RateLimit("requests must be at least 1"));
  }
  let period = config.window() / config.requests;
  if period.is_zero() {
    return Err(Error::RateLimit("window is too short for the request quota"));
  }
  Ok(period)
}

/// Wrap `router` with the per-IP limiter. Must be called within a Tokio
/// runtime; it spawns the task that sweeps idle clients.
pub fn limit_by_ip(router: Router, config: &RateLimitConfig) -> Result<Router, Error> {
  let governor = std::sync::Arc::new(
    GovernorConfigBuilder::default()
      .key_extractor(SmartIpKeyExtractor)
      .period(replenish_period(config)?)
      .burst_size(config.requests)
      .use_headers()
      .finish()
      .ok_or(Error::RateLimit("rejected by the limiter configuration"))?,
  );

  let limiter = governor.limiter().clone();
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(SWEEP_INTERVAL);
    loop {
      tick.tick().await;
      limiter.retain_recent();
      debug!(clients = limiter.len(), "swept rate limiter");
    }
  });

  Ok(
    router
      .layer(GovernorLayer { config: governor })
      .layer(middleware::map_response(rejection_body)),
  )
}

/// Give the limiter's plain-text 429 the API's JSON error shape and a
/// whole-second `Retry-After`.
async fn rejection_body(res: Response) -> Response {
  if res.status() != StatusCode::TOO_MANY_REQUESTS {
    return res;
  }
  let (mut parts, _) = res.into_parts();
  let wait = ["x-ratelimit-after", "retry-after"]
    .iter()
    .find_map(|name| parts.headers.get(*name))
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.trim().parse::<u64>().ok())
    .unwrap_or(1)
    .max(1);
  warn!(retry_after = wait, "rate limit exceeded");

  parts.headers.remove(header::CONTENT_TYPE);
  parts.headers.remove(header::CONTENT_LENGTH);
  parts.headers.insert(header::RETRY_AFTER, HeaderValue::from(wait));
  (
    parts,
    Json(json!({ "error": "rate limit exceeded", "retry_after": wait })),
  )
    .into_response()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn period_spreads_window_over_quota() {
    let cfg = RateLimitConfig { requests: 100, window_secs: 60 };
    assert_eq!(replenish_period(&cfg).unwrap(), Duration::from_millis(600));

    let cfg = RateLimitConfig { requests: 2, window_secs: 60 };
    assert_eq!(replenish_period(&cfg).unwrap(), Duration::from_secs(30));
  }

  #[test]
  fn degenerate_limits_are_rejected() {
    let zero = RateLimitConfig { requests: 0, window_secs: 60 };
    assert!(matches!(replenish_period(&zero), Err(Error::RateLimit(_))));

    let instant = RateLimitConfig { requests: 10, window_secs: 0 };
    assert!(matches!(replenish_period(&instant), Err(Error::RateLimit(_))));
  }

  #[tokio::test]
  async fn rejection_becomes_json_with_retry_after() {
    let res = axum::http::Response::builder()
      .status(StatusCode::TOO_MANY_REQUESTS)
      .header(header::CONTENT_TYPE, "text/plain")
      .header("x-ratelimit-after", "29")
      .body(axum::body::Body::from("Too Many Requests! Wait for 29s"))
      .unwrap();

    let res = rejection_body(res).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "29");
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "rate limit exceeded");
    assert_eq!(json["retry_after"], 29);
  }

  #[tokio::test]
  async fn sub_second_wait_rounds_up() {
    let res = axum::http::Response::builder()
      .status(StatusCode::TOO_MANY_REQUESTS)
      .header("x-ratelimit-after", "0")
      .body(axum::body::Body::empty())
      .unwrap();
    assert_eq!(rejection_body(res).await.headers()[header::RETRY_AFTER], "1");
  }

  #[tokio::test]
  async fn other_responses_pass_through() {
    let res = (StatusCode::UNAUTHORIZED, "nope").into_response();
    let res = rejection_body(res).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(!res.headers().contains_key(header::RETRY_AFTER));
  }
}
