//! Job and organization curation: listings that include expired jobs, and the
//! bulk expire/delete operations.

use axum::{Json, extract::State};
use remarcable_core::{
  job::Job,
  organization::Organization,
  page::PageRequest,
  store::{JobQuery, JobStore, OrganizationQuery},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{Affected, IdsBody};
use crate::{
  AppState,
  auth::AdminUser,
  error::ApiError,
  v1::{Data, OrganizationParams, Paginated},
  validation::{Checks, ValidJson, ValidQuery, clean},
};

#[derive(Debug, Deserialize)]
pub struct JobParams {
  pub search:          Option<String>,
  pub organization_id: Option<Uuid>,
  pub board_id:        Option<Uuid>,
  pub remote:          Option<bool>,
  pub country:         Option<String>,
  #[serde(default = "include_expired")]
  pub include_expired: bool,
  pub page:            Option<u32>,
  pub limit:           Option<u32>,
}

fn include_expired() -> bool { true }

/// `GET /jobs`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidQuery(params): ValidQuery<JobParams>,
) -> Result<Json<Paginated<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  let query = JobQuery {
    search: clean(params.search),
    organization_id: params.organization_id,
    board_id: params.board_id,
    remote: params.remote,
    country: clean(params.country),
    include_expired: params.include_expired,
    page: PageRequest::new(params.page, params.limit),
  };
  let page = state.store.list_jobs(&query).await.map_err(ApiError::internal)?;
  Ok(Json(Paginated::new(page, query.page)))
}

/// `POST /jobs/expire`: already expired jobs are left alone.
pub async fn expire<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ValidJson(body): ValidJson<IdsBody>,
) -> Result<Json<Data<Affected>>, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().ids("ids", &body.ids).finish()?;
  let affected = state
    .store
    .expire_jobs(body.into_unique())
    .await
    .map_err(ApiError::internal)?;
  info!(user_id = %admin.user_id, affected, "jobs expired");
  Ok(Json(Data { data: Affected { affected } }))
}

/// `POST /jobs/delete`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ValidJson(body): ValidJson<IdsBody>,
) -> Result<Json<Data<Affected>>, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().ids("ids", &body.ids).finish()?;
  let affected = state
    .store
    .delete_jobs(body.into_unique())
    .await
    .map_err(ApiError::internal)?;
  info!(user_id = %admin.user_id, affected, "jobs deleted");
  Ok(Json(Data { data: Affected { affected } }))
}

/// `GET /organizations`
pub async fn list_organizations<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidQuery(params): ValidQuery<OrganizationParams>,
) -> Result<Json<Paginated<Organization>>, ApiError>
where
  S: JobStore + 'static,
{
  let query = OrganizationQuery {
    search: clean(params.search),
    page:   PageRequest::new(params.page, params.limit),
  };
  let page = state.store.list_organizations(&query).await.map_err(ApiError::internal)?;
  Ok(Json(Paginated::new(page, query.page)))
}

/// `POST /organizations/delete`: removes their jobs and board assignments
/// too.
pub async fn delete_organizations<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  ValidJson(body): ValidJson<IdsBody>,
) -> Result<Json<Data<Affected>>, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().ids("ids", &body.ids).finish()?;
  let affected = state
    .store
    .delete_organizations(body.into_unique())
    .await
    .map_err(ApiError::internal)?;
  info!(user_id = %admin.user_id, affected, "organizations deleted");
  Ok(Json(Data { data: Affected { affected } }))
}
