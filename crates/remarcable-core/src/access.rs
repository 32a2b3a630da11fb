//! Access control records: API tokens for the public API, and admin users
//! with their sessions.
//!
//! Secrets are never stored. Tokens and session cookies are persisted as the
//! hex SHA-256 of their value; passwords as argon2 PHC strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── API tokens ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
  pub token_id:     Uuid,
  pub name:         String,
  #[serde(skip_serializing)]
  pub token_hash:   String,
  /// `None` means the token never expires.
  pub expires_at:   Option<DateTime<Utc>>,
  pub last_used_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
}

impl ApiToken {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiToken {
  pub name:       String,
  pub token_hash: String,
  pub expires_at: Option<DateTime<Utc>>,
}

// ─── Users and sessions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  pub email:         String,
  pub password_hash: String,
  pub is_admin:      bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_id: Uuid,
  pub user_id:    Uuid,
  #[serde(skip_serializing)]
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn token_without_expiry_never_expires() {
    let now = Utc::now();
    let mut token = ApiToken {
      token_id:     Uuid::new_v4(),
      name:         "partner".into(),
      token_hash:   "00".into(),
      expires_at:   None,
      last_used_at: None,
      created_at:   now,
    };
    assert!(!token.is_expired(now + Duration::days(10_000)));

    token.expires_at = Some(now);
    assert!(token.is_expired(now));
    assert!(!token.is_expired(now - Duration::seconds(1)));
  }

  #[test]
  fn token_hash_is_not_serialized() {
    let token = ApiToken {
      token_id:     Uuid::nil(),
      name:         "partner".into(),
      token_hash:   "deadbeef".into(),
      expires_at:   None,
      last_used_at: None,
      created_at:   Utc::now(),
    };
    let json = serde_json::to_string(&token).unwrap();
    assert!(!json.contains("deadbeef"));
  }
}
