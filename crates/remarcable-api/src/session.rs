//! `/api/auth` handlers: exchange credentials for a session cookie and drop
//! it again.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use remarcable_core::{access::User, store::JobStore};
use serde::Deserialize;
use tracing::info;

use crate::{
  AppState,
  auth::{SESSION_COOKIE, generate_secret, hash_secret, session_cookie, verify_password},
  error::ApiError,
  v1::Data,
  validation::{Checks, ValidJson},
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

fn cookie(value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, ApiError> {
  let secure = if secure { "; Secure" } else { "" };
  HeaderValue::from_str(&format!(
    "{SESSION_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}{secure}"
  ))
  .map_err(ApiError::internal)
}

/// `POST /login`: body: `{"email": "...", "password": "..."}`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  ValidJson(body): ValidJson<LoginBody>,
) -> Result<Response, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new()
    .check(!body.email.trim().is_empty(), "email", "must not be blank")
    .check(!body.password.is_empty(), "password", "must not be blank")
    .finish()?;

  let email = body.email.trim().to_lowercase();
  let user: User = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::internal)?
    .filter(|u| verify_password(&body.password, &u.password_hash))
    .ok_or(ApiError::InvalidCredentials)?;

  let secret = generate_secret();
  let expires_at = Utc::now() + state.session_ttl;
  state
    .store
    .create_session(user.user_id, hash_secret(&secret), expires_at)
    .await
    .map_err(ApiError::internal)?;
  info!(user_id = %user.user_id, "admin login");

  let set_cookie = cookie(&secret, state.session_ttl.num_seconds(), state.secure_cookies)?;
  Ok(([(header::SET_COOKIE, set_cookie)], Json(Data { data: user })).into_response())
}

/// `POST /logout`: always succeeds and clears the cookie.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: JobStore + 'static,
{
  if let Some(value) = session_cookie(&headers) {
    state
      .store
      .delete_session(&hash_secret(value))
      .await
      .map_err(ApiError::internal)?;
  }
  let cleared = cookie("", 0, state.secure_cookies)?;
  Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cleared)]).into_response())
}
