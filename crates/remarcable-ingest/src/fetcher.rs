//! `JobsFetcher`: one fetch-and-persist cycle against a [`JobStore`].
//!
//! Each [`JobsFetcher::fetch_and_save`] call builds its own
//! [`OrganizationCache`], so one fetcher can be shared between requests. Writes
//! are committed one by one; a failure halfway leaves earlier rows in place,
//! and re-running the same query is idempotent by `external_id`.

use std::{
  collections::{BTreeMap, HashMap},
  time::Instant,
};

use chrono::Utc;
use remarcable_core::{
  fetch_log::{FetchCounts, FetchStatus, NewFetchLog},
  organization::{NewOrganization, OrganizationKey, enrichment_patch},
  store::JobStore,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  client::JobSource,
  error::FetchError,
  mapper,
  query::QueryBuilder,
  types::ApiJob,
};

/// Number of items [`JobsFetcher::preview`] returns.
pub const PREVIEW_SIZE: usize = 5;

/// Organizations resolved so far in one run, by dedup key.
#[derive(Debug, Default)]
pub struct OrganizationCache {
  resolved: HashMap<OrganizationKey, Uuid>,
}

impl OrganizationCache {
  pub fn get(&self, key: &OrganizationKey) -> Option<Uuid> { self.resolved.get(key).copied() }

  pub fn insert(&mut self, key: OrganizationKey, id: Uuid) { self.resolved.insert(key, id); }

  pub fn len(&self) -> usize { self.resolved.len() }

  pub fn is_empty(&self) -> bool { self.resolved.is_empty() }
}

/// Outcome of one [`JobsFetcher::fetch_and_save`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchSummary {
  pub fetch_log_id: Uuid,
  pub status:       FetchStatus,
  #[serde(flatten)]
  pub counts:       FetchCounts,
  /// One message per failed item.
  pub errors:       Vec<String>,
  pub duration_ms:  u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
  Created,
  Updated,
}

pub struct JobsFetcher<'a, S, C> {
  store:  &'a S,
  source: &'a C,
}

impl<'a, S, C> JobsFetcher<'a, S, C>
where
  S: JobStore,
  C: JobSource,
{
  pub fn new(store: &'a S, source: &'a C) -> Self { Self { store, source } }

  /// Run `query`, persist every returned job and record a fetch log.
  ///
  /// Upstream failures and malformed responses are returned as errors after a
  /// best-effort `error` log is written. Failures of single items are
  /// collected into the summary and mark the run `partial`.
  pub async fn fetch_and_save(
    &self,
    query: &QueryBuilder,
    saved_query_id: Option<Uuid>,
  ) -> Result<FetchSummary, FetchError> {
    let started = Instant::now();
    let params = query.build();
    let mut logged_params: serde_json::Map<String, Value> = params
      .iter()
      .map(|(k, v)| (k.clone(), Value::String(v.clone())))
      .collect();
    logged_params.insert("endpoint".into(), Value::String(query.window().to_string()));
    let logged_params = Value::Object(logged_params);

    let items = match self.search(query, &params).await {
      Ok(items) => items,
      Err(err) => {
        error!(error = %err, "fetch failed");
        let log = NewFetchLog {
          status:         FetchStatus::Error,
          counts:         FetchCounts::default(),
          params:         logged_params,
          error_message:  Some(err.to_string()),
          duration_ms:    elapsed_ms(started),
          saved_query_id,
        };
        if let Err(log_err) = self.store.record_fetch_log(log).await {
          warn!(error = %log_err, "could not record failed fetch");
        }
        self.mark_run(saved_query_id).await;
        return Err(err);
      }
    };

    let mut counts = FetchCounts {
      jobs_fetched: u32::try_from(items.len()).unwrap_or(u32::MAX),
      ..FetchCounts::default()
    };
    let mut cache = OrganizationCache::default();
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
      match self.save_item(item, &mut cache, &mut counts).await {
        Ok(Upsert::Created) => counts.jobs_created += 1,
        Ok(Upsert::Updated) => counts.jobs_updated += 1,
        Err(err) => {
          warn!(index, error = %err, "skipping job");
          errors.push(format!("item {index}: {err}"));
        }
      }
    }

    let status = if errors.is_empty() {
      FetchStatus::Success
    } else {
      FetchStatus::Partial
    };
    let duration_ms = elapsed_ms(started);
    let log = self
      .store
      .record_fetch_log(NewFetchLog {
        status,
        counts,
        params: logged_params,
        error_message: (!errors.is_empty()).then(|| errors.join("; ")),
        duration_ms,
        saved_query_id,
      })
      .await
      .map_err(FetchError::store)?;
    self.mark_run(saved_query_id).await;

    info!(
      %status,
      fetched = counts.jobs_fetched,
      created = counts.jobs_created,
      updated = counts.jobs_updated,
      orgs_created = counts.orgs_created,
      orgs_seen = cache.len(),
      duration_ms,
      "fetch complete"
    );

    Ok(FetchSummary {
      fetch_log_id: log.fetch_log_id,
      status,
      counts,
      errors,
      duration_ms,
    })
  }

  /// Run `query` with pagination forced to (5, 0) and return at most five raw
  /// items. Nothing is persisted.
  pub async fn preview(&self, query: &QueryBuilder) -> Result<Vec<Value>, FetchError> {
    let query = query.clone().pagination(PREVIEW_SIZE as i64, 0);
    let mut items = self.search(&query, &query.build()).await?;
    items.truncate(PREVIEW_SIZE);
    Ok(items)
  }

  async fn search(
    &self,
    query: &QueryBuilder,
    params: &BTreeMap<String, String>,
  ) -> Result<Vec<Value>, FetchError> {
    match self.source.search_jobs(query.window(), params).await? {
      Value::Array(items) => Ok(items),
      _ => Err(FetchError::InvalidResponse),
    }
  }

  async fn mark_run(&self, saved_query_id: Option<Uuid>) {
    let Some(id) = saved_query_id else { return };
    if let Err(err) = self.store.mark_saved_query_run(id, Utc::now()).await {
      warn!(saved_query_id = %id, error = %err, "could not stamp saved query run");
    }
  }

  async fn save_item(
    &self,
    item: Value,
    cache: &mut OrganizationCache,
    counts: &mut FetchCounts,
  ) -> Result<Upsert, FetchError> {
    let api: ApiJob = serde_json::from_value(item)?;
    let organization_id = self
      .resolve_organization(mapper::organization(&api), cache, counts)
      .await?;
    let job = mapper::job(&api, organization_id)?;

    let existing = self
      .store
      .find_job_by_external_id(&job.external_id)
      .await
      .map_err(FetchError::store)?;
    match existing {
      Some(existing) => {
        self
          .store
          .update_job(existing.job_id, job)
          .await
          .map_err(FetchError::store)?;
        Ok(Upsert::Updated)
      }
      None => {
        self.store.create_job(job).await.map_err(FetchError::store)?;
        Ok(Upsert::Created)
      }
    }
  }

  /// Find or create the organization for `input`.
  ///
  /// Lookup order: the run's cache, then the store by LinkedIn slug, then by
  /// domain. Name-only organizations are never looked up in the store, so the
  /// same company seen without a slug or domain in two runs yields two rows.
  async fn resolve_organization(
    &self,
    input: NewOrganization,
    cache: &mut OrganizationCache,
    counts: &mut FetchCounts,
  ) -> Result<Uuid, FetchError> {
    let key = OrganizationKey::derive(&input)?;
    if let Some(id) = cache.get(&key) {
      return Ok(id);
    }

    let mut existing = None;
    if let Some(slug) = input.linkedin_slug.as_deref() {
      existing = self
        .store
        .find_organization_by_slug(slug)
        .await
        .map_err(FetchError::store)?;
    }
    if existing.is_none() {
      if let Some(domain) = input.domain.as_deref() {
        existing = self
          .store
          .find_organization_by_domain(domain)
          .await
          .map_err(FetchError::store)?;
      }
    }

    let id = match existing {
      Some(org) => {
        if let Some(patch) = enrichment_patch(&org, &input) {
          self
            .store
            .patch_organization(org.organization_id, patch)
            .await
            .map_err(FetchError::store)?;
          counts.orgs_updated += 1;
        }
        org.organization_id
      }
      None => {
        let org = self
          .store
          .create_organization(input)
          .await
          .map_err(FetchError::store)?;
        counts.orgs_created += 1;
        org.organization_id
      }
    };

    cache.insert(key, id);
    Ok(id)
  }
}

fn elapsed_ms(started: Instant) -> u64 {
  u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
