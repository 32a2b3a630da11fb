//! Board management and board assignments.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/boards` | public and private |
//! | `POST`   | `/boards` | 409 on a taken slug |
//! | `GET`    | `/boards/{id}` | |
//! | `PATCH`  | `/boards/{id}` | |
//! | `DELETE` | `/boards/{id}` | |
//! | `GET`    | `/boards/{id}/jobs` | includes expired jobs |
//! | `POST`   | `/boards/{id}/jobs` | body: `{"ids": [...]}` |
//! | `DELETE` | `/boards/{id}/jobs/{job_id}` | |
//! | `POST`   | `/boards/{id}/organizations` | body: `{"ids": [...]}` |
//! | `DELETE` | `/boards/{id}/organizations/{org_id}` | |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use remarcable_core::{
  board::{BoardUpdate, JobBoard, NewBoard},
  job::Job,
  page::PageRequest,
  store::{JobQuery, JobStore},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{Affected, IdsBody};
use crate::{
  AppState,
  auth::AdminUser,
  error::ApiError,
  v1::{Data, PageParams, Paginated},
  validation::{Checks, ValidJson, ValidQuery, clean, double_option},
};

async fn board<S: JobStore>(store: &S, id: Uuid) -> Result<JobBoard, ApiError> {
  store
    .get_board(id)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("board {id} not found")))
}

/// 409 if `slug` belongs to a board other than `except`.
async fn ensure_slug_free<S: JobStore>(
  store: &S,
  slug: &str,
  except: Option<Uuid>,
) -> Result<(), ApiError> {
  let taken = store
    .get_board_by_slug(slug)
    .await
    .map_err(ApiError::internal)?
    .is_some_and(|b| Some(b.board_id) != except);
  if taken {
    return Err(ApiError::Conflict(format!("slug {slug} is already in use")));
  }
  Ok(())
}

// ─── CRUD ────────────────────────────────────────────────────────────────────

/// `GET /boards`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Data<Vec<JobBoard>>>, ApiError>
where
  S: JobStore + 'static,
{
  let boards = state.store.list_boards(false).await.map_err(ApiError::internal)?;
  Ok(Json(Data { data: boards }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub slug:        String,
  pub description: Option<String>,
  #[serde(default = "default_public")]
  pub is_public:   bool,
}

fn default_public() -> bool { true }

/// `POST /boards`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  ValidJson(body): ValidJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JobStore + 'static,
{
  let slug = body.slug.trim().to_owned();
  Checks::new().name("name", &body.name).slug("slug", &slug).finish()?;
  ensure_slug_free(&*state.store, &slug, None).await?;

  let board = state
    .store
    .create_board(NewBoard {
      name: body.name.trim().to_owned(),
      slug,
      description: clean(body.description),
      is_public: body.is_public,
    })
    .await
    .map_err(ApiError::internal)?;
  info!(board_id = %board.board_id, slug = %board.slug, "board created");
  Ok((StatusCode::CREATED, Json(Data { data: board })))
}

/// `GET /boards/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Data<JobBoard>>, ApiError>
where
  S: JobStore + 'static,
{
  Ok(Json(Data { data: board(&*state.store, id).await? }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:        Option<String>,
  pub slug:        Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub description: Option<Option<String>>,
  pub is_public:   Option<bool>,
}

/// `PATCH /boards/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<UpdateBody>,
) -> Result<Json<Data<JobBoard>>, ApiError>
where
  S: JobStore + 'static,
{
  let slug = body.slug.map(|s| s.trim().to_owned());
  let mut checks = Checks::new();
  if let Some(name) = &body.name {
    checks.name("name", name);
  }
  if let Some(slug) = &slug {
    checks.slug("slug", slug);
  }
  checks.finish()?;
  if let Some(slug) = &slug {
    ensure_slug_free(&*state.store, slug, Some(id)).await?;
  }

  let update = BoardUpdate {
    name: body.name.map(|n| n.trim().to_owned()),
    slug,
    description: body.description.map(clean),
    is_public: body.is_public,
  };
  let board = state
    .store
    .update_board(id, update)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("board {id} not found")))?;
  Ok(Json(Data { data: board }))
}

/// `DELETE /boards/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore + 'static,
{
  if state.store.delete_board(id).await.map_err(ApiError::internal)? {
    info!(board_id = %id, "board deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("board {id} not found")))
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// `GET /boards/{id}/jobs`
pub async fn jobs<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  ValidQuery(params): ValidQuery<PageParams>,
) -> Result<Json<Paginated<Job>>, ApiError>
where
  S: JobStore + 'static,
{
  board(&*state.store, id).await?;
  let query = JobQuery {
    board_id: Some(id),
    include_expired: true,
    page: PageRequest::new(params.page, params.limit),
    ..JobQuery::default()
  };
  let page = state.store.list_jobs(&query).await.map_err(ApiError::internal)?;
  Ok(Json(Paginated::new(page, query.page)))
}

/// `POST /boards/{id}/jobs`: unknown and already assigned ids are skipped.
pub async fn assign_jobs<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<IdsBody>,
) -> Result<Json<Data<Affected>>, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().ids("ids", &body.ids).finish()?;
  board(&*state.store, id).await?;
  let affected = state
    .store
    .assign_jobs(id, body.into_unique())
    .await
    .map_err(ApiError::internal)?;
  Ok(Json(Data { data: Affected { affected } }))
}

/// `DELETE /boards/{id}/jobs/{job_id}`
pub async fn unassign_job<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path((id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore + 'static,
{
  if state.store.unassign_job(id, job_id).await.map_err(ApiError::internal)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("job {job_id} is not assigned to board {id}")))
  }
}

/// `POST /boards/{id}/organizations`
pub async fn assign_organizations<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  ValidJson(body): ValidJson<IdsBody>,
) -> Result<Json<Data<Affected>>, ApiError>
where
  S: JobStore + 'static,
{
  Checks::new().ids("ids", &body.ids).finish()?;
  board(&*state.store, id).await?;
  let affected = state
    .store
    .assign_organizations(id, body.into_unique())
    .await
    .map_err(ApiError::internal)?;
  Ok(Json(Data { data: Affected { affected } }))
}

/// `DELETE /boards/{id}/organizations/{org_id}`
pub async fn unassign_organization<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path((id, org_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore + 'static,
{
  if state.store.unassign_organization(id, org_id).await.map_err(ApiError::internal)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("organization {org_id} is not assigned to board {id}")))
  }
}
