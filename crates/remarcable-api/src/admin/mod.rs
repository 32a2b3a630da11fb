//! Handlers for `/api/admin` endpoints.
//!
//! Every handler takes an [`AdminUser`](crate::auth::AdminUser): requests
//! without a live session get 401, sessions of non-admin users get 403.

pub mod boards;
pub mod fetch;
pub mod jobs;
pub mod queries;
pub mod tokens;

use std::sync::Arc;

use remarcable_core::store::JobStore;
use remarcable_ingest::FantasticJobsClient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, validation::unique_ids};

/// Body of every bulk operation: `{"ids": [...]}`.
#[derive(Debug, Deserialize)]
pub struct IdsBody {
  pub ids: Vec<Uuid>,
}

impl IdsBody {
  pub fn into_unique(self) -> Vec<Uuid> { unique_ids(self.ids) }
}

/// Result of a bulk operation.
#[derive(Debug, Serialize)]
pub struct Affected {
  pub affected: u64,
}

fn source<S: JobStore>(state: &AppState<S>) -> Result<Arc<FantasticJobsClient>, ApiError> {
  state
    .source
    .clone()
    .ok_or(ApiError::NotConfigured("fantastic-jobs API"))
}
