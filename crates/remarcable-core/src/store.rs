//! The `JobStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `remarcable-store-sqlite`). Higher layers (`remarcable-ingest`,
//! `remarcable-api`) depend on this abstraction, not on any concrete backend.
//!
//! Each method is its own unit of work; there is no transaction spanning
//! several calls.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  access::{ApiToken, NewApiToken, NewUser, Session, User},
  board::{BoardUpdate, JobBoard, NewBoard},
  fetch_log::{FetchLog, NewFetchLog},
  job::{Job, NewJob},
  organization::{NewOrganization, Organization, OrganizationPatch},
  page::{Page, PageRequest},
  saved_query::{NewSavedQuery, SavedQuery, SavedQueryUpdate},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`JobStore::list_jobs`].
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
  /// Case-insensitive substring match over title and description.
  pub search:           Option<String>,
  pub organization_id:  Option<Uuid>,
  /// Restrict to jobs visible on this board.
  pub board_id:         Option<Uuid>,
  pub remote:           Option<bool>,
  /// Exact match against any derived country.
  pub country:          Option<String>,
  /// Include admin-expired jobs and jobs past their validity.
  pub include_expired:  bool,
  pub page:             PageRequest,
}

/// Parameters for [`JobStore::list_organizations`].
#[derive(Debug, Clone, Default)]
pub struct OrganizationQuery {
  /// Case-insensitive substring match over the organization name.
  pub search: Option<String>,
  pub page:   PageRequest,
}

/// Aggregate counters for `/api/v1/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
  pub total_jobs:    u64,
  pub active_jobs:   u64,
  pub remote_jobs:   u64,
  pub organizations: u64,
  pub boards:        u64,
  pub last_fetch_at: Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a job-board store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait JobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Organizations ─────────────────────────────────────────────────────

  fn create_organization(
    &self,
    input: NewOrganization,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  /// Fill the gaps described by `patch` and return the updated row. Fields
  /// already populated in the store are never overwritten.
  fn patch_organization(
    &self,
    id: Uuid,
    patch: OrganizationPatch,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn get_organization(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// Look up by LinkedIn slug (case-insensitive).
  fn find_organization_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + 'a;

  /// Look up by normalized domain.
  fn find_organization_by_domain<'a>(
    &'a self,
    domain: &'a str,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + 'a;

  fn list_organizations<'a>(
    &'a self,
    query: &'a OrganizationQuery,
  ) -> impl Future<Output = Result<Page<Organization>, Self::Error>> + Send + 'a;

  /// Delete organizations together with their jobs and board assignments.
  /// Returns the number of organizations removed.
  fn delete_organizations(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Jobs ──────────────────────────────────────────────────────────────

  fn create_job(
    &self,
    input: NewJob,
  ) -> impl Future<Output = Result<Job, Self::Error>> + Send + '_;

  /// Replace every ingested field of an existing job. `expired_at` and
  /// `created_at` are preserved.
  fn update_job(
    &self,
    id: Uuid,
    input: NewJob,
  ) -> impl Future<Output = Result<Job, Self::Error>> + Send + '_;

  fn get_job(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Job>, Self::Error>> + Send + '_;

  fn find_job_by_external_id<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Job>, Self::Error>> + Send + 'a;

  fn list_jobs<'a>(
    &'a self,
    query: &'a JobQuery,
  ) -> impl Future<Output = Result<Page<Job>, Self::Error>> + Send + 'a;

  /// Stamp `expired_at` on jobs that are not yet expired. Returns the number
  /// of rows changed.
  fn expire_jobs(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn delete_jobs(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Fetch logs ────────────────────────────────────────────────────────

  fn record_fetch_log(
    &self,
    input: NewFetchLog,
  ) -> impl Future<Output = Result<FetchLog, Self::Error>> + Send + '_;

  /// Most recent first.
  fn list_fetch_logs(
    &self,
    saved_query_id: Option<Uuid>,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<FetchLog>, Self::Error>> + Send + '_;

  // ── Boards ────────────────────────────────────────────────────────────

  fn create_board(
    &self,
    input: NewBoard,
  ) -> impl Future<Output = Result<JobBoard, Self::Error>> + Send + '_;

  fn get_board(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<JobBoard>, Self::Error>> + Send + '_;

  fn get_board_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<JobBoard>, Self::Error>> + Send + 'a;

  fn list_boards(
    &self,
    public_only: bool,
  ) -> impl Future<Output = Result<Vec<JobBoard>, Self::Error>> + Send + '_;

  /// Returns `None` if the board does not exist.
  fn update_board(
    &self,
    id: Uuid,
    update: BoardUpdate,
  ) -> impl Future<Output = Result<Option<JobBoard>, Self::Error>> + Send + '_;

  /// Returns `false` if the board did not exist.
  fn delete_board(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Assign jobs to a board; already-assigned jobs are skipped. Returns the
  /// number of new assignments.
  fn assign_jobs(
    &self,
    board_id: Uuid,
    job_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn unassign_job(
    &self,
    board_id: Uuid,
    job_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn assign_organizations(
    &self,
    board_id: Uuid,
    organization_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn unassign_organization(
    &self,
    board_id: Uuid,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Saved queries ─────────────────────────────────────────────────────

  fn create_saved_query(
    &self,
    input: NewSavedQuery,
  ) -> impl Future<Output = Result<SavedQuery, Self::Error>> + Send + '_;

  fn get_saved_query(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SavedQuery>, Self::Error>> + Send + '_;

  fn list_saved_queries(
    &self,
  ) -> impl Future<Output = Result<Vec<SavedQuery>, Self::Error>> + Send + '_;

  fn update_saved_query(
    &self,
    id: Uuid,
    update: SavedQueryUpdate,
  ) -> impl Future<Output = Result<Option<SavedQuery>, Self::Error>> + Send + '_;

  fn delete_saved_query(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn mark_saved_query_run(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── API tokens ────────────────────────────────────────────────────────

  fn create_api_token(
    &self,
    input: NewApiToken,
  ) -> impl Future<Output = Result<ApiToken, Self::Error>> + Send + '_;

  fn find_api_token_by_hash<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<ApiToken>, Self::Error>> + Send + 'a;

  fn touch_api_token(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_api_tokens(
    &self,
  ) -> impl Future<Output = Result<Vec<ApiToken>, Self::Error>> + Send + '_;

  fn delete_api_token(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users and sessions ────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Resolve a session and its user by the hash of the cookie value.
  fn find_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<(Session, User)>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn stats(&self) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;
}
