//! Handlers for the public `/api/v1` endpoints.
//!
//! Every endpoint requires a bearer token. Lists answer with a
//! `{data, pagination}` envelope, single resources with `{data}`. Expired
//! jobs and non-public boards are invisible here.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/jobs` | `search`, `organization_id`, `board`, `remote`, `country` |
//! | `GET`  | `/jobs/{id}` | |
//! | `GET`  | `/organizations` | `search` |
//! | `GET`  | `/organizations/{id}` | |
//! | `GET`  | `/organizations/{id}/jobs` | |
//! | `GET`  | `/boards` | public boards only |
//! | `GET`  | `/boards/{slug}` | |
//! | `GET`  | `/boards/{slug}/jobs` | |
//! | `GET`  | `/stats` | |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use remarcable_core::{
  board::JobBoard,
  job::Job,
  organization::Organization,
  page::{Page, PageRequest, Pagination},
  store::{JobQuery, JobStore, OrganizationQuery, Stats},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::ApiClient,
  error::ApiError,
  validation::{ValidQuery, clean},
};

// ─── Envelopes ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub data: T,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
  pub data:       Vec<T>,
  pub pagination: Pagination,
}

impl<T> Paginated<T> {
  pub fn new(page: Page<T>, request: PageRequest) -> Self {
    Self { pagination: Pagination::new(request, page.total), data: page.items }
  }
}

/// `page` and `limit` alone. Filtered lists repeat the two fields inline;
/// `serde(flatten)` breaks numeric fields in query strings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

impl PageParams {
  pub fn request(&self) -> PageRequest { PageRequest::new(self.page, self.limit) }
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobParams {
  pub search:          Option<String>,
  pub organization_id: Option<Uuid>,
  /// Board slug.
  pub board:           Option<String>,
  pub remote:          Option<bool>,
  pub country:         Option<String>,
  pub page:            Option<u32>,
  pub limit:           Option<u32>,
}

async fn public_board<S: JobStore>(store: &S, slug: &str) -> Result<JobBoard, ApiError> {
  store
    .get_board_by_slug(slug)
    .await
    .map_err(ApiError::internal)?
    .filter(|b| b.is_public)
    .ok_or_else(|| ApiError::NotFound(format!("board {slug} not found")))
}

async fn list_page<S: JobStore>(store: &S, query: JobQuery) -> Result<Paginated<Job>, ApiError> {
  let page = store.list_jobs(&query).await.map_err(ApiError::internal)?;
  Ok(Paginated::new(page, query.page))
}

/// `GET /jobs`
pub async fn list_jobs<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  ValidQuery(params): ValidQuery<JobParams>,
) -> Result<Json<Paginated<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  let board_id = match params.board.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
    Some(slug) => Some(public_board(&*state.store, slug).await?.board_id),
    None => None,
  };
  let query = JobQuery {
    search: clean(params.search),
    organization_id: params.organization_id,
    board_id,
    remote: params.remote,
    country: clean(params.country),
    include_expired: false,
    page: PageRequest::new(params.page, params.limit),
  };
  Ok(Json(list_page(&*state.store, query).await?))
}

/// `GET /jobs/{id}`
pub async fn get_job<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  Path(id): Path<Uuid>,
) -> Result<Json<Data<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  let job = state
    .store
    .get_job(id)
    .await
    .map_err(ApiError::internal)?
    .filter(|j| !j.is_expired(Utc::now()))
    .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))?;
  Ok(Json(Data { data: job }))
}

// ─── Organizations ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationParams {
  pub search: Option<String>,
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
}

/// `GET /organizations`
pub async fn list_organizations<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
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

async fn organization<S: JobStore>(store: &S, id: Uuid) -> Result<Organization, ApiError> {
  store
    .get_organization(id)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("organization {id} not found")))
}

/// `GET /organizations/{id}`
pub async fn get_organization<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  Path(id): Path<Uuid>,
) -> Result<Json<Data<Organization>>, ApiError>
where
  S: JobStore + 'static,
{
  Ok(Json(Data { data: organization(&*state.store, id).await? }))
}

/// `GET /organizations/{id}/jobs`
pub async fn organization_jobs<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  Path(id): Path<Uuid>,
  ValidQuery(params): ValidQuery<PageParams>,
) -> Result<Json<Paginated<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  organization(&*state.store, id).await?;
  let query = JobQuery {
    organization_id: Some(id),
    page: params.request(),
    ..JobQuery::default()
  };
  Ok(Json(list_page(&*state.store, query).await?))
}

// ─── Boards ──────────────────────────────────────────────────────────────────

/// `GET /boards`
pub async fn list_boards<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
) -> Result<Json<Data<Vec<JobBoard>>>, ApiError>
where
  S: JobStore + 'static,
{
  let boards = state.store.list_boards(true).await.map_err(ApiError::internal)?;
  Ok(Json(Data { data: boards }))
}

/// `GET /boards/{slug}`
pub async fn get_board<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  Path(slug): Path<String>,
) -> Result<Json<Data<JobBoard>>, ApiError>
where
  S: JobStore + 'static,
{
  Ok(Json(Data { data: public_board(&*state.store, &slug).await? }))
}

/// `GET /boards/{slug}/jobs`
pub async fn board_jobs<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
  Path(slug): Path<String>,
  ValidQuery(params): ValidQuery<JobParams>,
) -> Result<Json<Paginated<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  let board = public_board(&*state.store, &slug).await?;
  let query = JobQuery {
    search: clean(params.search),
    organization_id: params.organization_id,
    board_id: Some(board.board_id),
    remote: params.remote,
    country: clean(params.country),
    include_expired: false,
    page: PageRequest::new(params.page, params.limit),
  };
  Ok(Json(list_page(&*state.store, query).await?))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  _client: ApiClient,
) -> Result<Json<Data<Stats>>, ApiError>
where
  S: JobStore + 'static,
{
  let stats = state.store.stats().await.map_err(ApiError::internal)?;
  Ok(Json(Data { data: stats }))
}
