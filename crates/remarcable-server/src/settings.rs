//! Runtime configuration, deserialised from `config.toml` layered with
//! `REMARCABLE_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `REMARCABLE_FANTASTIC_JOBS__API_KEY`. `REMARCABLE_CORS_ORIGINS` takes a
//! comma-separated list.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

pub const ENV_PREFIX: &str = "REMARCABLE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub database_path:     PathBuf,
  /// Origins allowed to call the API from a browser.
  pub cors_origins:      Vec<String>,
  pub rate_limit:        RateLimitConfig,
  pub session_ttl_hours: i64,
  /// Mark the session cookie `Secure`; enable behind HTTPS.
  pub secure_cookies:    bool,
  pub fantastic_jobs:    UpstreamConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      database_path:     PathBuf::from("remarcable.db"),
      cors_origins:      [
        "https://remarcablejobs.com",
        "https://www.remarcablejobs.com",
        "https://remarcable-jobs.vercel.app",
        "http://localhost:3000",
      ]
      .map(String::from)
      .to_vec(),
      rate_limit:        RateLimitConfig::default(),
      session_ttl_hours: 24 * 7,
      secure_cookies:    false,
      fantastic_jobs:    UpstreamConfig::default(),
    }
  }
}

/// Per-IP limit on `/api/v1`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  pub requests:    u32,
  pub window_secs: u64,
}

impl Default for RateLimitConfig {
  fn default() -> Self { Self { requests: 100, window_secs: 60 } }
}

impl RateLimitConfig {
  pub fn window(&self) -> Duration { Duration::from_secs(self.window_secs) }
}

/// Credentials for the RapidAPI-hosted search API. A blank key disables the
/// fetch endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  pub api_key:      String,
  pub api_host:     String,
  pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      api_host:     "active-jobs-db.p.rapidapi.com".to_string(),
      timeout_secs: 30,
    }
  }
}

impl ServerConfig {
  /// Layer `file` (optional) under the environment.
  pub fn load(file: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()?
      .try_deserialize()
  }
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.rate_limit.requests, 100);
    assert_eq!(cfg.rate_limit.window(), Duration::from_secs(60));
    assert!(cfg.cors_origins.contains(&"http://localhost:3000".to_string()));
    assert!(cfg.fantastic_jobs.api_key.is_empty());
  }

  #[test]
  fn nested_sections_override_partially() {
    let cfg = from_toml(
      r#"
      port = 9000
      cors_origins = ["https://boards.example"]

      [rate_limit]
      requests = 5

      [fantastic_jobs]
      api_key = "k"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.cors_origins, ["https://boards.example"]);
    assert_eq!(cfg.rate_limit.requests, 5);
    assert_eq!(cfg.rate_limit.window_secs, 60);
    assert_eq!(cfg.fantastic_jobs.api_key, "k");
    assert_eq!(cfg.fantastic_jobs.api_host, "active-jobs-db.p.rapidapi.com");
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(PathBuf::from("/nonexistent/remarcable.toml")).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
  }
}
