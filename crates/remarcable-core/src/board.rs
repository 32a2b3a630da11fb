//! Job boards: the tenants of the platform.
//!
//! A job appears on a board when it is assigned to the board directly or when
//! its organization is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBoard {
  pub board_id:    Uuid,
  pub name:        String,
  /// URL-safe unique handle used by the public API.
  pub slug:        String,
  pub description: Option<String>,
  /// Non-public boards are hidden from `/api/v1/boards`.
  pub is_public:   bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::JobStore::create_board`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
  pub name:        String,
  pub slug:        String,
  pub description: Option<String>,
  pub is_public:   bool,
}

/// Partial update; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardUpdate {
  pub name:        Option<String>,
  pub slug:        Option<String>,
  /// `Some(None)` clears the description.
  pub description: Option<Option<String>>,
  pub is_public:   Option<bool>,
}

/// Check that `slug` is lowercase ASCII alphanumerics separated by single
/// hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
  !slug.is_empty()
    && !slug.starts_with('-')
    && !slug.ends_with('-')
    && !slug.contains("--")
    && slug
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slug_rules() {
    assert!(is_valid_slug("remote-rust-2024"));
    assert!(!is_valid_slug(""));
    assert!(!is_valid_slug("Remote"));
    assert!(!is_valid_slug("-remote"));
    assert!(!is_valid_slug("remote--rust"));
    assert!(!is_valid_slug("remote rust"));
  }
}
