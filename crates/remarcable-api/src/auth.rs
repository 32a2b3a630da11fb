//! Credentials: bearer API tokens for `/api/v1`, session cookies for
//! `/api/admin`, and the hashing helpers both rely on.
//!
//! Secrets never reach the store. API tokens and session cookies are looked
//! up by the hex SHA-256 of their value; passwords are argon2 PHC strings.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use remarcable_core::{
  access::{ApiToken, User},
  store::JobStore,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::{AppState, error::ApiError};

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Prefix of generated API token secrets.
pub const TOKEN_PREFIX: &str = "rj_";

// ─── Hashing ─────────────────────────────────────────────────────────────────

/// Hex SHA-256 of a token or cookie value.
pub fn hash_secret(secret: &str) -> String { hex::encode(Sha256::digest(secret.as_bytes())) }

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_secret() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

pub fn generate_api_token() -> String { format!("{TOKEN_PREFIX}{}", generate_secret()) }

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `false` for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
    .is_ok()
}

// ─── Header parsing ──────────────────────────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// The value of the session cookie, if the request carries one.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value)
    .filter(|v| !v.is_empty())
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// A request authenticated with a live API token.
///
/// Rejects with [`ApiError::InvalidToken`], which carries
/// `WWW-Authenticate: Bearer`.
pub struct ApiClient(pub ApiToken);

impl<S> FromRequestParts<AppState<S>> for ApiClient
where
  S: JobStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let secret = bearer_token(&parts.headers).ok_or(ApiError::InvalidToken)?;
    let token = state
      .store
      .find_api_token_by_hash(&hash_secret(secret))
      .await
      .map_err(ApiError::internal)?
      .ok_or(ApiError::InvalidToken)?;

    let now = Utc::now();
    if token.is_expired(now) {
      return Err(ApiError::InvalidToken);
    }
    if let Err(e) = state.store.touch_api_token(token.token_id, now).await {
      warn!(token_id = %token.token_id, error = %e, "could not record token use");
    }
    Ok(ApiClient(token))
  }
}

/// A request carrying a live session of an admin user.
///
/// Rejects with 401 without a valid session and 403 for non-admins.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: JobStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let cookie = session_cookie(&parts.headers).ok_or(ApiError::Unauthenticated)?;
    let (session, user) = state
      .store
      .find_session(&hash_secret(cookie))
      .await
      .map_err(ApiError::internal)?
      .ok_or(ApiError::Unauthenticated)?;

    if session.is_expired(Utc::now()) {
      return Err(ApiError::Unauthenticated);
    }
    if !user.is_admin {
      return Err(ApiError::Forbidden);
    }
    Ok(AdminUser(user))
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use chrono::Duration;
  use remarcable_core::access::{NewApiToken, NewUser};
  use remarcable_store_sqlite::SqliteStore;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    AppState::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn add_token(state: &AppState<SqliteStore>, secret: &str, expires_in: Option<Duration>) {
    state
      .store
      .create_api_token(NewApiToken {
        name:       "partner".into(),
        token_hash: hash_secret(secret),
        expires_at: expires_in.map(|d| Utc::now() + d),
      })
      .await
      .unwrap();
  }

  async fn add_session(state: &AppState<SqliteStore>, cookie: &str, is_admin: bool) {
    let user = state
      .store
      .create_user(NewUser {
        email: format!("{cookie}@example.com"),
        password_hash: hash_password("pw").unwrap(),
        is_admin,
      })
      .await
      .unwrap();
    state
      .store
      .create_session(user.user_id, hash_secret(cookie), Utc::now() + Duration::hours(1))
      .await
      .unwrap();
  }

  fn parts(header_name: header::HeaderName, value: &str) -> Parts {
    let req = Request::builder().header(header_name, value).body(Body::empty()).unwrap();
    req.into_parts().0
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not a phc string"));
  }

  #[test]
  fn generated_tokens_are_distinct() {
    let a = generate_api_token();
    let b = generate_api_token();
    assert!(a.starts_with(TOKEN_PREFIX));
    assert_ne!(a, b);
    assert_eq!(hash_secret(&a).len(), 64);
  }

  #[test]
  fn session_cookie_among_others() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, "theme=dark; session=abc123; lang=en".parse().unwrap());
    assert_eq!(session_cookie(&headers), Some("abc123"));

    headers.insert(header::COOKIE, "sessionx=nope".parse().unwrap());
    assert_eq!(session_cookie(&headers), None);
  }

  #[tokio::test]
  async fn live_token_is_accepted_and_touched() {
    let state = make_state().await;
    add_token(&state, "rj_live", None).await;

    let mut p = parts(header::AUTHORIZATION, "Bearer rj_live");
    let ApiClient(token) = ApiClient::from_request_parts(&mut p, &state).await.unwrap();

    let stored = state.store.find_api_token_by_hash(&token.token_hash).await.unwrap().unwrap();
    assert!(stored.last_used_at.is_some());
  }

  #[tokio::test]
  async fn expired_token_is_rejected() {
    let state = make_state().await;
    add_token(&state, "rj_old", Some(Duration::hours(-1))).await;

    let mut p = parts(header::AUTHORIZATION, "Bearer rj_old");
    assert!(matches!(
      ApiClient::from_request_parts(&mut p, &state).await,
      Err(ApiError::InvalidToken)
    ));
  }

  #[tokio::test]
  async fn unknown_or_malformed_token_is_rejected() {
    let state = make_state().await;
    for value in ["Bearer rj_nope", "Basic dXNlcjpwYXNz", "Bearer "] {
      let mut p = parts(header::AUTHORIZATION, value);
      assert!(matches!(
        ApiClient::from_request_parts(&mut p, &state).await,
        Err(ApiError::InvalidToken)
      ));
    }
  }

  #[tokio::test]
  async fn admin_session_is_accepted() {
    let state = make_state().await;
    add_session(&state, "admin-cookie", true).await;

    let mut p = parts(header::COOKIE, "session=admin-cookie");
    let AdminUser(user) = AdminUser::from_request_parts(&mut p, &state).await.unwrap();
    assert!(user.is_admin);
  }

  #[tokio::test]
  async fn non_admin_is_forbidden() {
    let state = make_state().await;
    add_session(&state, "viewer-cookie", false).await;

    let mut p = parts(header::COOKIE, "session=viewer-cookie");
    assert!(matches!(
      AdminUser::from_request_parts(&mut p, &state).await,
      Err(ApiError::Forbidden)
    ));
  }

  #[tokio::test]
  async fn missing_session_is_unauthenticated() {
    let state = make_state().await;
    let mut p = parts(header::COOKIE, "session=unknown");
    assert!(matches!(
      AdminUser::from_request_parts(&mut p, &state).await,
      Err(ApiError::Unauthenticated)
    ));
  }
}
