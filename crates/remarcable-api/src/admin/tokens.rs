//! API token management. The secret is returned once, by `POST /tokens`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use remarcable_core::{
  access::{ApiToken, NewApiToken},
  store::JobStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, generate_api_token, hash_secret},
  error::ApiError,
  v1::Data,
  validation::{Checks, ValidJson},
};

/// `GET /tokens`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Data<Vec<ApiToken>>>, ApiError>
where
  S: JobStore + 'static,
{
  let tokens = state.store.list_api_tokens().await.map_err(ApiError::internal)?;
  Ok(Json(Data { data: tokens }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:       String,
  /// Omit for a token that never expires.
  pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreatedToken {
  #[serde(flatten)]
  pub token: ApiToken,
  /// The bearer value. Not recoverable later.
  pub secret: String,
}

/// `POST /tokens`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidJson(body): ValidJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new()
    .name("name", &body.name)
    .check(
      body.expires_at.is_none_or(|at| at > Utc::now()),
      "expires_at",
      "must be in the future",
    )
    .finish()?;

  let secret = generate_api_token();
  let token = state
    .store
    .create_api_token(NewApiToken {
      name:       body.name.trim().to_owned(),
      token_hash: hash_secret(&secret),
      expires_at: body.expires_at,
    })
    .await
    .map_err(ApiError::internal)?;
  info!(token_id = %token.token_id, name = %token.name, "api token created");
  Ok((StatusCode::CREATED, Json(Data { data: CreatedToken { token, secret } })))
}

/// `DELETE /tokens/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore + 'static,
{
  if state.store.delete_api_token(id).await.map_err(ApiError::internal)? {
    info!(token_id = %id, "api token revoked");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("token {id} not found")))
  }
}
