//! Async HTTP client for the RapidAPI-hosted fantastic-jobs search API.

use std::{collections::BTreeMap, future::Future, time::Duration};

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{error, warn};

use crate::{error::ClientError, query::TimeWindow};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff schedule for transient failures.
///
/// Retry `n` (1-based) waits `base_delay × 2ⁿ`, so the default schedule is
/// 2 s, 4 s, 8 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub base_delay:  Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_retries: 3, base_delay: Duration::from_secs(1) }
  }
}

impl RetryPolicy {
  pub fn delay(&self, retry: u32) -> Duration {
    self.base_delay.saturating_mul(2u32.saturating_pow(retry))
  }
}

/// Connection settings for the upstream API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub api_key:  String,
  pub api_host: String,
  /// Overrides `https://{api_host}`; used to point tests at a local server.
  pub base_url: Option<String>,
  pub timeout:  Duration,
  pub retry:    RetryPolicy,
}

impl ClientConfig {
  pub fn new(api_key: impl Into<String>, api_host: impl Into<String>) -> Self {
    Self {
      api_key:  api_key.into(),
      api_host: api_host.into(),
      base_url: None,
      timeout:  DEFAULT_TIMEOUT,
      retry:    RetryPolicy::default(),
    }
  }
}

// ─── JobSource ───────────────────────────────────────────────────────────────

/// The two upstream operations the fetcher depends on.
pub trait JobSource: Send + Sync {
  /// `GET /{window}` with the built query parameters. Returns the raw body.
  fn search_jobs<'a>(
    &'a self,
    window: TimeWindow,
    params: &'a BTreeMap<String, String>,
  ) -> impl Future<Output = Result<Value, ClientError>> + Send + 'a;

  /// `GET /job/{id}`. Returns the raw body.
  fn get_job<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Value, ClientError>> + Send + 'a;
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FantasticJobsClient {
  client:   Client,
  base_url: Url,
  api_key:  String,
  api_host: String,
  retry:    RetryPolicy,
}

impl FantasticJobsClient {
  /// Fails with [`ClientError::MissingConfig`] when the key or host is blank.
  pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
    if config.api_key.trim().is_empty() {
      return Err(ClientError::MissingConfig("api_key"));
    }
    if config.api_host.trim().is_empty() {
      return Err(ClientError::MissingConfig("api_host"));
    }

    let client = Client::builder().timeout(config.timeout).build()?;
    let base_url = config
      .base_url
      .unwrap_or_else(|| format!("https://{}", config.api_host.trim()));
    let base_url = Url::parse(&base_url)
      .ok()
      .filter(|url| !url.cannot_be_a_base())
      .ok_or(ClientError::InvalidBaseUrl(base_url))?;

    Ok(Self {
      client,
      base_url,
      api_key: config.api_key,
      api_host: config.api_host,
      retry: config.retry,
    })
  }

  fn is_retriable(err: &reqwest::Error) -> bool { err.is_timeout() || err.is_connect() }

  /// `base_url` with `segments` appended, each percent-encoded as a single
  /// path segment.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  /// `GET {base_url}/{segments..}`, retrying transport failures and 5xx
  /// responses.
  async fn get_json(
    &self,
    segments: &[&str],
    params: &BTreeMap<String, String>,
  ) -> Result<Value, ClientError> {
    let url = self.url(segments);
    let path = url.path();
    let mut retries = 0;

    loop {
      let result = self
        .client
        .get(url.as_str())
        .header("x-rapidapi-key", &self.api_key)
        .header("x-rapidapi-host", &self.api_host)
        .query(params)
        .send()
        .await;

      let transient = match &result {
        Ok(resp) => resp.status().is_server_error(),
        Err(e) => Self::is_retriable(e),
      };
      if transient && retries < self.retry.max_retries {
        retries += 1;
        let delay = self.retry.delay(retries);
        match &result {
          Ok(resp) => warn!(
            path,
            status = resp.status().as_u16(),
            retry = retries,
            ?delay,
            "upstream server error; retrying"
          ),
          Err(e) => warn!(path, error = %e, retry = retries, ?delay, "upstream unreachable; retrying"),
        }
        tokio::time::sleep(delay).await;
        continue;
      }

      let resp = result.inspect_err(|e| error!(path, error = %e, "upstream request failed"))?;
      let status = resp.status();
      let body = resp.text().await?;

      if !status.is_success() {
        let message = upstream_message(status, &body);
        error!(path, status = status.as_u16(), %message, "upstream returned an error");
        return Err(ClientError::Status { status: status.as_u16(), message });
      }

      return serde_json::from_str(&body).map_err(|e| {
        error!(path, error = %e, "upstream body is not JSON");
        ClientError::Decode(e)
      });
    }
  }
}

impl JobSource for FantasticJobsClient {
  async fn search_jobs(
    &self,
    window: TimeWindow,
    params: &BTreeMap<String, String>,
  ) -> Result<Value, ClientError> {
    self.get_json(&[window.as_ref()], params).await
  }

  async fn get_job(&self, id: &str) -> Result<Value, ClientError> {
    self.get_json(&["job", id], &BTreeMap::new()).await
  }
}

/// Best human-readable message from an error body: its `message` or `error`
/// field, the body itself, or the status reason.
fn upstream_message(status: StatusCode, body: &str) -> String {
  let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
    ["message", "error"]
      .into_iter()
      .find_map(|k| v.get(k).and_then(Value::as_str).map(str::to_owned))
  });
  from_json
    .or_else(|| {
      let body = body.trim();
      (!body.is_empty()).then(|| body.chars().take(200).collect())
    })
    .unwrap_or_else(|| status.canonical_reason().unwrap_or("upstream error").to_owned())
}
