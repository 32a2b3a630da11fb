//! Ad-hoc fetch runs, previews and the fetch log.

use axum::{Json, extract::State};
use remarcable_core::{fetch_log::FetchLog, page::MAX_PAGE_SIZE, store::JobStore};
use remarcable_ingest::{FetchSummary, JobsFetcher, QueryBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::source;
use crate::{
  AppState,
  auth::AdminUser,
  error::ApiError,
  v1::Data,
  validation::{ValidJson, ValidQuery},
};

const DEFAULT_LOG_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct FetchBody {
  /// `QueryBuilder` JSON form.
  pub params:         Value,
  pub saved_query_id: Option<Uuid>,
}

/// `POST /fetch`
pub async fn run<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ValidJson(body): ValidJson<FetchBody>,
) -> Result<Json<Data<FetchSummary>>, ApiError>
where
  S: JobStore + 'static,
{
  let query = QueryBuilder::from_json(&body.params)?;
  if let Some(id) = body.saved_query_id {
    state
      .store
      .get_saved_query(id)
      .await
      .map_err(ApiError::internal)?
      .ok_or_else(|| ApiError::field("saved_query_id", "unknown saved query"))?;
  }
  let client = source(&state)?;

  info!(user_id = %admin.user_id, "manual fetch");
  let summary = JobsFetcher::new(&*state.store, &*client)
    .fetch_and_save(&query, body.saved_query_id)
    .await?;
  Ok(Json(Data { data: summary }))
}

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
  pub params: Value,
}

/// `POST /fetch/preview`: at most five raw upstream items, nothing stored.
pub async fn preview<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidJson(body): ValidJson<PreviewBody>,
) -> Result<Json<Data<Vec<Value>>>, ApiError>
where
  S: JobStore + 'static,
{
  let query = QueryBuilder::from_json(&body.params)?;
  let client = source(&state)?;
  let items = JobsFetcher::new(&*state.store, &*client).preview(&query).await?;
  Ok(Json(Data { data: items }))
}

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub saved_query_id: Option<Uuid>,
  pub limit:          Option<u32>,
}

/// `GET /fetch-logs[?saved_query_id=..&limit=..]`: newest first.
pub async fn logs<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidQuery(params): ValidQuery<LogParams>,
) -> Result<Json<Data<Vec<FetchLog>>>, ApiError>
where
  S: JobStore + 'static,
{
  let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_PAGE_SIZE);
  let logs = state
    .store
    .list_fetch_logs(params.saved_query_id, limit)
    .await
    .map_err(ApiError::internal)?;
  Ok(Json(Data { data: logs }))
}
