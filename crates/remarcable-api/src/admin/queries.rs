//! Saved queries: named fetch parameter sets an admin can re-run.
//!
//! `params` is validated through [`QueryBuilder::from_json`] on the way in and
//! stored in its normalized `to_json` form.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use remarcable_core::{
  saved_query::{NewSavedQuery, SavedQuery, SavedQueryUpdate},
  store::JobStore,
};
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
  validation::{Checks, ValidJson, clean, double_option},
};

async fn saved_query<S: JobStore>(store: &S, id: Uuid) -> Result<SavedQuery, ApiError> {
  store
    .get_saved_query(id)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("saved query {id} not found")))
}

/// `GET /queries`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Data<Vec<SavedQuery>>>, ApiError>
where
  S: JobStore + 'static,
{
  let queries = state.store.list_saved_queries().await.map_err(ApiError::internal)?;
  Ok(Json(Data { data: queries }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub description: Option<String>,
  pub params:      Value,
}

/// `POST /queries`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidJson(body): ValidJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().name("name", &body.name).finish()?;
  let params = QueryBuilder::from_json(&body.params)?.to_json();

  let query = state
    .store
    .create_saved_query(NewSavedQuery {
      name: body.name.trim().to_owned(),
      description: clean(body.description),
      params,
    })
    .await
    .map_err(ApiError::internal)?;
  Ok((StatusCode::CREATED, Json(Data { data: query })))
}

/// `GET /queries/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Data<SavedQuery>>, ApiError>
where
  S: JobStore + 'static,
{
  Ok(Json(Data { data: saved_query(&*state.store, id).await? }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub description: Option<Option<String>>,
  pub params:      Option<Value>,
}

/// `PATCH /queries/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<UpdateBody>,
) -> Result<Json<Data<SavedQuery>>, ApiError>
where
  S: JobStore + 'static,
{
  if let Some(name) = &body.name {
    Checks::new().name("name", name).finish()?;
  }
  let params = body
    .params
    .as_ref()
    .map(|p| QueryBuilder::from_json(p).map(|q| q.to_json()))
    .transpose()?;

  let update = SavedQueryUpdate {
    name: body.name.map(|n| n.trim().to_owned()),
    description: body.description.map(clean),
    params,
  };
  let query = state
    .store
    .update_saved_query(id, update)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("saved query {id} not found")))?;
  Ok(Json(Data { data: query }))
}

/// `DELETE /queries/{id}`: its fetch logs are kept and lose the link.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore + 'static,
{
  if state.store.delete_saved_query(id).await.map_err(ApiError::internal)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("saved query {id} not found")))
  }
}

/// `POST /queries/{id}/run`
pub async fn run<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Data<FetchSummary>>, ApiError>
where
  S: JobStore + 'static,
{
  let saved = saved_query(&*state.store, id).await?;
  let query = QueryBuilder::from_json(&saved.params)?;
  let client = source(&state)?;

  info!(saved_query_id = %id, user_id = %admin.user_id, "running saved query");
  let summary = JobsFetcher::new(&*state.store, &*client)
    .fetch_and_save(&query, Some(id))
    .await?;
  Ok(Json(Data { data: summary }))
}
