//! JSON REST API for the Remarcable job board.
//!
//! Exposes axum routers backed by any [`remarcable_core::store::JobStore`]:
//!
//! - [`v1_router`]: the public, bearer-token API.
//! - [`admin_router`]: curation and ingestion, behind an admin session.
//! - [`auth_router`]: login and logout.
//!
//! CORS, rate limiting and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api/v1", remarcable_api::v1_router(state.clone()))
//!   .nest("/api/admin", remarcable_api::admin_router(state.clone()))
//!   .nest("/api/auth", remarcable_api::auth_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod session;
pub mod v1;
pub mod validation;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use chrono::Duration;
use remarcable_core::store::JobStore;
use remarcable_ingest::FantasticJobsClient;

pub use error::ApiError;

/// Lifetime of an admin session unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::days(7);

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:          Arc<S>,
  /// `None` when no upstream credentials are configured; fetch endpoints
  /// then fail with a 500.
  pub source:         Option<Arc<FantasticJobsClient>>,
  pub session_ttl:    Duration,
  /// Adds `Secure` to the session cookie.
  pub secure_cookies: bool,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          self.store.clone(),
      source:         self.source.clone(),
      session_ttl:    self.session_ttl,
      secure_cookies: self.secure_cookies,
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: S) -> Self {
    Self {
      store:          Arc::new(store),
      source:         None,
      session_ttl:    DEFAULT_SESSION_TTL,
      secure_cookies: false,
    }
  }

  pub fn with_source(mut self, client: FantasticJobsClient) -> Self {
    self.source = Some(Arc::new(client));
    self
  }

  pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
    self.session_ttl = ttl;
    self
  }

  pub fn with_secure_cookies(mut self, on: bool) -> Self {
    self.secure_cookies = on;
    self
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// `/api/v1` routes.
pub fn v1_router<S>(state: AppState<S>) -> Router<()>
where
  S: JobStore + 'static,
{
  Router::new()
    .route("/jobs", get(v1::list_jobs::<S>))
    .route("/jobs/{id}", get(v1::get_job::<S>))
    .route("/organizations", get(v1::list_organizations::<S>))
    .route("/organizations/{id}", get(v1::get_organization::<S>))
    .route("/organizations/{id}/jobs", get(v1::organization_jobs::<S>))
    .route("/boards", get(v1::list_boards::<S>))
    .route("/boards/{slug}", get(v1::get_board::<S>))
    .route("/boards/{slug}/jobs", get(v1::board_jobs::<S>))
    .route("/stats", get(v1::stats::<S>))
    .with_state(state)
}

/// `/api/admin` routes.
pub fn admin_router<S>(state: AppState<S>) -> Router<()>
where
  S: JobStore + 'static,
{
  use admin::{boards, fetch, jobs, queries, tokens};

  Router::new()
    // Boards
    .route("/boards", get(boards::list::<S>).post(boards::create::<S>))
    .route(
      "/boards/{id}",
      get(boards::get_one::<S>)
        .patch(boards::update::<S>)
        .delete(boards::delete::<S>),
    )
    .route("/boards/{id}/jobs", get(boards::jobs::<S>).post(boards::assign_jobs::<S>))
    .route("/boards/{id}/jobs/{job_id}", delete(boards::unassign_job::<S>))
    .route("/boards/{id}/organizations", post(boards::assign_organizations::<S>))
    .route(
      "/boards/{id}/organizations/{org_id}",
      delete(boards::unassign_organization::<S>),
    )
    // Saved queries
    .route("/queries", get(queries::list::<S>).post(queries::create::<S>))
    .route(
      "/queries/{id}",
      get(queries::get_one::<S>)
        .patch(queries::update::<S>)
        .delete(queries::delete::<S>),
    )
    .route("/queries/{id}/run", post(queries::run::<S>))
    // Tokens
    .route("/tokens", get(tokens::list::<S>).post(tokens::create::<S>))
    .route("/tokens/{id}", delete(tokens::delete::<S>))
    // Jobs and organizations
    .route("/jobs", get(jobs::list::<S>))
    .route("/jobs/expire", post(jobs::expire::<S>))
    .route("/jobs/delete", post(jobs::delete::<S>))
    .route("/organizations", get(jobs::list_organizations::<S>))
    .route("/organizations/delete", post(jobs::delete_organizations::<S>))
    // Ingestion
    .route("/fetch", post(fetch::run::<S>))
    .route("/fetch/preview", post(fetch::preview::<S>))
    .route("/fetch-logs", get(fetch::logs::<S>))
    .with_state(state)
}

/// `/api/auth` routes.
pub fn auth_router<S>(state: AppState<S>) -> Router<()>
where
  S: JobStore + 'static,
{
  Router::new()
    .route("/login", post(session::login::<S>))
    .route("/logout", post(session::logout::<S>))
    .with_state(state)
}

/// All three routers under `/api`, without any middleware.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: JobStore + 'static,
{
  Router::new()
    .nest("/api/v1", v1_router(state.clone()))
    .nest("/api/admin", admin_router(state.clone()))
    .nest("/api/auth", auth_router(state))
}
