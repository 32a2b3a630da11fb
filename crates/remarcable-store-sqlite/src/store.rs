//! [`SqliteStore`]: the SQLite implementation of [`JobStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use remarcable_core::{
  access::{ApiToken, NewApiToken, NewUser, Session, User},
  board::{BoardUpdate, JobBoard, NewBoard},
  fetch_log::{FetchLog, NewFetchLog},
  job::{Job, NewJob},
  organization::{NewOrganization, Organization, OrganizationPatch},
  page::Page,
  saved_query::{NewSavedQuery, SavedQuery, SavedQueryUpdate},
  store::{JobQuery, JobStore, OrganizationQuery, Stats},
};

use crate::{
  Error, Result,
  encode::{
    BOARD_COLUMNS, FETCH_LOG_COLUMNS, JOB_COLUMNS, ORG_COLUMNS, RawApiToken,
    RawBoard, RawFetchLog, RawJob, RawOrganization, RawSavedQuery, RawSession,
    RawUser, SAVED_QUERY_COLUMNS, TOKEN_COLUMNS, USER_COLUMNS,
    decode_opt_dt, encode_dt, encode_json, encode_opt_dt, encode_uuid,
    encode_uuids,
  },
  schema::SCHEMA,
};

type FromRow<R> = fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>;

/// `?{start}, ?{start+1}, …` for `n` positional parameters.
fn placeholders(start: usize, n: usize) -> String {
  (start..start + n)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// A `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\` taken
/// literally. Pair with `ESCAPE '\'`.
fn contains_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// Shared `WHERE` clause for job listing and counting; binds `?1`–`?7`.
const JOB_FILTER: &str = "
  (?1 IS NULL OR title LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\')
  AND (?2 IS NULL OR organization_id = ?2)
  AND (?3 IS NULL
       OR job_id IN (SELECT job_id FROM board_jobs WHERE board_id = ?3)
       OR organization_id IN
          (SELECT organization_id FROM board_organizations WHERE board_id = ?3))
  AND (?4 IS NULL OR remote = ?4)
  AND (?5 IS NULL OR EXISTS (
       SELECT 1 FROM json_each(location_json, '$.countries') c
       WHERE c.value = ?5 COLLATE NOCASE))
  AND (?6 = 1 OR (expired_at IS NULL
                  AND (valid_through IS NULL OR valid_through > ?7)))";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A job-board store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Run a single-row query with one text parameter.
  async fn select_one<R>(
    &self,
    sql: String,
    arg: String,
    from_row: FromRow<R>,
  ) -> Result<Option<R>>
  where
    R: Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, [arg], from_row).optional()?))
        .await?,
    )
  }

  /// Run a multi-row query with text parameters.
  async fn select_many<R>(
    &self,
    sql: String,
    args: Vec<String>,
    from_row: FromRow<R>,
  ) -> Result<Vec<R>>
  where
    R: Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(args), from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  /// Execute a statement with text parameters and return the number of rows
  /// changed.
  async fn execute(&self, sql: String, args: Vec<Option<String>>) -> Result<u64> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&sql, rusqlite::params_from_iter(args))?)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn organization_row(&self, id: Uuid) -> Result<Option<Organization>> {
    self
      .select_one(
        format!("SELECT {ORG_COLUMNS} FROM organizations WHERE organization_id = ?1"),
        encode_uuid(id),
        RawOrganization::from_row,
      )
      .await?
      .map(RawOrganization::into_organization)
      .transpose()
  }

  async fn job_row(&self, id: Uuid) -> Result<Option<Job>> {
    self
      .select_one(
        format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?1"),
        encode_uuid(id),
        RawJob::from_row,
      )
      .await?
      .map(RawJob::into_job)
      .transpose()
  }

  /// Encode the ingested columns of a job, in `JOB_COLUMNS` order from
  /// `title` through `ai_json`.
  fn job_values(input: &NewJob) -> Result<Vec<Option<String>>> {
    Ok(vec![
      Some(input.title.clone()),
      input.url.clone(),
      encode_opt_dt(input.date_posted),
      encode_opt_dt(input.date_created),
      encode_opt_dt(input.valid_through),
      input.description.clone(),
      Some(encode_json(&input.location)?),
      input.remote.map(|r| if r { "1" } else { "0" }.to_owned()),
      Some(encode_json(&input.employment_types)?),
      input.salary_raw.as_ref().map(encode_json).transpose()?,
      input.source.source.clone(),
      input.source.source_type.clone(),
      input.source.source_domain.clone(),
      input.ai.as_ref().map(encode_json).transpose()?,
    ])
  }
}

// ─── JobStore impl ───────────────────────────────────────────────────────────

impl JobStore for SqliteStore {
  type Error = Error;

  // ── Organizations ─────────────────────────────────────────────────────────

  async fn create_organization(&self, input: NewOrganization) -> Result<Organization> {
    let now = Utc::now();
    let org = Organization {
      organization_id: Uuid::new_v4(),
      name:            input.name,
      url:             input.url,
      domain:          input.domain,
      logo:            input.logo,
      linkedin_slug:   input.linkedin_slug,
      linkedin_url:    input.linkedin_url,
      linkedin:        input.linkedin,
      created_at:      now,
      updated_at:      now,
    };

    let args = vec![
      Some(encode_uuid(org.organization_id)),
      Some(org.name.clone()),
      org.url.clone(),
      org.domain.clone(),
      org.logo.clone(),
      org.linkedin_slug.clone(),
      org.linkedin_url.clone(),
      Some(encode_json(&org.linkedin)?),
      Some(encode_dt(now)),
      Some(encode_dt(now)),
    ];
    self
      .execute(
        format!(
          "INSERT INTO organizations ({ORG_COLUMNS}) VALUES ({})",
          placeholders(1, 10)
        ),
        args,
      )
      .await?;

    Ok(org)
  }

  async fn patch_organization(
    &self,
    id: Uuid,
    patch: OrganizationPatch,
  ) -> Result<Organization> {
    // COALESCE keeps any value already present, so a stale patch can never
    // clobber a field filled in the meantime.
    let changed = self
      .execute(
        "UPDATE organizations SET
           logo          = COALESCE(logo, ?2),
           linkedin_url  = COALESCE(linkedin_url, ?3),
           linkedin_json = json_set(linkedin_json,
             '$.employees',
             COALESCE(json_extract(linkedin_json, '$.employees'), CAST(?4 AS INTEGER)),
             '$.followers',
             COALESCE(json_extract(linkedin_json, '$.followers'), CAST(?5 AS INTEGER)),
             '$.description',
             COALESCE(json_extract(linkedin_json, '$.description'), ?6)),
           updated_at    = ?7
         WHERE organization_id = ?1"
          .to_owned(),
        vec![
          Some(encode_uuid(id)),
          patch.logo,
          patch.linkedin_url,
          patch.employees.map(|n| n.to_string()),
          patch.followers.map(|n| n.to_string()),
          patch.description,
          Some(encode_dt(Utc::now())),
        ],
      )
      .await?;

    if changed == 0 {
      return Err(Error::OrganizationNotFound(id));
    }
    self
      .organization_row(id)
      .await?
      .ok_or(Error::OrganizationNotFound(id))
  }

  async fn get_organization(&self, id: Uuid) -> Result<Option<Organization>> {
    self.organization_row(id).await
  }

  async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
    self
      .select_one(
        format!(
          "SELECT {ORG_COLUMNS} FROM organizations
           WHERE linkedin_slug = ?1 COLLATE NOCASE
           ORDER BY created_at LIMIT 1"
        ),
        slug.to_owned(),
        RawOrganization::from_row,
      )
      .await?
      .map(RawOrganization::into_organization)
      .transpose()
  }

  async fn find_organization_by_domain(&self, domain: &str) -> Result<Option<Organization>> {
    self
      .select_one(
        format!(
          "SELECT {ORG_COLUMNS} FROM organizations
           WHERE domain = ?1
           ORDER BY created_at LIMIT 1"
        ),
        domain.to_owned(),
        RawOrganization::from_row,
      )
      .await?
      .map(RawOrganization::into_organization)
      .transpose()
  }

  async fn list_organizations(&self, query: &OrganizationQuery) -> Result<Page<Organization>> {
    let pattern = query.search.as_deref().map(contains_pattern);
    let limit   = i64::from(query.page.limit());
    let offset  = query.page.offset() as i64;

    let (raws, total) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM organizations WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')",
          rusqlite::params![pattern],
          |r| r.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {ORG_COLUMNS} FROM organizations
           WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')
           ORDER BY name COLLATE NOCASE, organization_id
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![pattern, limit, offset],
            RawOrganization::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((rows, total))
      })
      .await?;

    Ok(Page {
      items: raws
        .into_iter()
        .map(RawOrganization::into_organization)
        .collect::<Result<_>>()?,
      total: total as u64,
    })
  }

  async fn delete_organizations(&self, ids: Vec<Uuid>) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }
    let args = encode_uuids(&ids).into_iter().map(Some).collect();
    self
      .execute(
        format!(
          "DELETE FROM organizations WHERE organization_id IN ({})",
          placeholders(1, ids.len())
        ),
        args,
      )
      .await
  }

  // ── Jobs ──────────────────────────────────────────────────────────────────

  async fn create_job(&self, input: NewJob) -> Result<Job> {
    let now    = Utc::now();
    let job_id = Uuid::new_v4();

    let mut args = vec![
      Some(encode_uuid(job_id)),
      Some(input.external_id.clone()),
      Some(encode_uuid(input.organization_id)),
    ];
    args.extend(Self::job_values(&input)?);
    args.extend([None, Some(encode_dt(now)), Some(encode_dt(now))]);

    self
      .execute(
        format!("INSERT INTO jobs ({JOB_COLUMNS}) VALUES ({})", placeholders(1, 20)),
        args,
      )
      .await?;

    Ok(Job {
      job_id,
      external_id: input.external_id,
      organization_id: input.organization_id,
      title: input.title,
      url: input.url,
      date_posted: input.date_posted,
      date_created: input.date_created,
      valid_through: input.valid_through,
      description: input.description,
      location: input.location,
      remote: input.remote,
      employment_types: input.employment_types,
      salary_raw: input.salary_raw,
      source: input.source,
      ai: input.ai,
      expired_at: None,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_job(&self, id: Uuid, input: NewJob) -> Result<Job> {
    let mut args = vec![
      Some(encode_uuid(id)),
      Some(input.external_id.clone()),
      Some(encode_uuid(input.organization_id)),
    ];
    args.extend(Self::job_values(&input)?);
    args.push(Some(encode_dt(Utc::now())));

    let changed = self
      .execute(
        "UPDATE jobs SET
           external_id = ?2, organization_id = ?3, title = ?4, url = ?5,
           date_posted = ?6, date_created = ?7, valid_through = ?8,
           description = ?9, location_json = ?10, remote = CAST(?11 AS INTEGER),
           employment_types = ?12, salary_raw = ?13, source = ?14,
           source_type = ?15, source_domain = ?16, ai_json = ?17,
           updated_at = ?18
         WHERE job_id = ?1"
          .to_owned(),
        args,
      )
      .await?;

    if changed == 0 {
      return Err(Error::JobNotFound(id));
    }
    self.job_row(id).await?.ok_or(Error::JobNotFound(id))
  }

  async fn get_job(&self, id: Uuid) -> Result<Option<Job>> { self.job_row(id).await }

  async fn find_job_by_external_id(&self, external_id: &str) -> Result<Option<Job>> {
    self
      .select_one(
        format!("SELECT {JOB_COLUMNS} FROM jobs WHERE external_id = ?1"),
        external_id.to_owned(),
        RawJob::from_row,
      )
      .await?
      .map(RawJob::into_job)
      .transpose()
  }

  async fn list_jobs(&self, query: &JobQuery) -> Result<Page<Job>> {
    let pattern   = query.search.as_deref().map(contains_pattern);
    let org_id    = query.organization_id.map(encode_uuid);
    let board_id  = query.board_id.map(encode_uuid);
    let remote    = query.remote;
    let country   = query.country.clone();
    let inc_exp   = query.include_expired;
    let now       = encode_dt(Utc::now());
    let limit     = i64::from(query.page.limit());
    let offset    = query.page.offset() as i64;

    let (raws, total) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM jobs WHERE {JOB_FILTER}"),
          rusqlite::params![pattern, org_id, board_id, remote, country, inc_exp, now],
          |r| r.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {JOB_COLUMNS} FROM jobs WHERE {JOB_FILTER}
           ORDER BY COALESCE(date_posted, created_at) DESC, job_id
           LIMIT ?8 OFFSET ?9"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              pattern, org_id, board_id, remote, country, inc_exp, now, limit,
              offset,
            ],
            RawJob::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((rows, total))
      })
      .await?;

    Ok(Page {
      items: raws.into_iter().map(RawJob::into_job).collect::<Result<_>>()?,
      total: total as u64,
    })
  }

  async fn expire_jobs(&self, ids: Vec<Uuid>) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }
    let mut args = vec![Some(encode_dt(Utc::now()))];
    args.extend(encode_uuids(&ids).into_iter().map(Some));
    self
      .execute(
        format!(
          "UPDATE jobs SET expired_at = ?1, updated_at = ?1
           WHERE expired_at IS NULL AND job_id IN ({})",
          placeholders(2, ids.len())
        ),
        args,
      )
      .await
  }

  async fn delete_jobs(&self, ids: Vec<Uuid>) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }
    let args = encode_uuids(&ids).into_iter().map(Some).collect();
    self
      .execute(
        format!("DELETE FROM jobs WHERE job_id IN ({})", placeholders(1, ids.len())),
        args,
      )
      .await
  }

  // ── Fetch logs ────────────────────────────────────────────────────────────

  async fn record_fetch_log(&self, input: NewFetchLog) -> Result<FetchLog> {
    let log = FetchLog {
      fetch_log_id:   Uuid::new_v4(),
      status:         input.status,
      counts:         input.counts,
      params:         input.params,
      error_message:  input.error_message,
      duration_ms:    input.duration_ms,
      saved_query_id: input.saved_query_id,
      created_at:     Utc::now(),
    };

    let id_str      = encode_uuid(log.fetch_log_id);
    let status_str  = log.status.as_ref().to_owned();
    let c           = log.counts;
    let params_str  = encode_json(&log.params)?;
    let error_msg   = log.error_message.clone();
    let duration    = i64::try_from(log.duration_ms).unwrap_or(i64::MAX);
    let query_id    = log.saved_query_id.map(encode_uuid);
    let at_str      = encode_dt(log.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO fetch_logs ({FETCH_LOG_COLUMNS}) VALUES ({})",
            placeholders(1, 12)
          ),
          rusqlite::params![
            id_str,
            status_str,
            c.jobs_fetched,
            c.jobs_created,
            c.jobs_updated,
            c.orgs_created,
            c.orgs_updated,
            params_str,
            error_msg,
            duration,
            query_id,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn list_fetch_logs(
    &self,
    saved_query_id: Option<Uuid>,
    limit: u32,
  ) -> Result<Vec<FetchLog>> {
    let query_id = saved_query_id.map(encode_uuid);
    let raws: Vec<RawFetchLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FETCH_LOG_COLUMNS} FROM fetch_logs
           WHERE (?1 IS NULL OR saved_query_id = ?1)
           ORDER BY created_at DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![query_id, limit], RawFetchLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFetchLog::into_fetch_log).collect()
  }

  // ── Boards ────────────────────────────────────────────────────────────────

  async fn create_board(&self, input: NewBoard) -> Result<JobBoard> {
    let now = Utc::now();
    let board = JobBoard {
      board_id:    Uuid::new_v4(),
      name:        input.name,
      slug:        input.slug,
      description: input.description,
      is_public:   input.is_public,
      created_at:  now,
      updated_at:  now,
    };

    self
      .execute(
        format!("INSERT INTO job_boards ({BOARD_COLUMNS}) VALUES ({})", placeholders(1, 7)),
        vec![
          Some(encode_uuid(board.board_id)),
          Some(board.name.clone()),
          Some(board.slug.clone()),
          board.description.clone(),
          Some(if board.is_public { "1" } else { "0" }.to_owned()),
          Some(encode_dt(now)),
          Some(encode_dt(now)),
        ],
      )
      .await?;

    Ok(board)
  }

  async fn get_board(&self, id: Uuid) -> Result<Option<JobBoard>> {
    self
      .select_one(
        format!("SELECT {BOARD_COLUMNS} FROM job_boards WHERE board_id = ?1"),
        encode_uuid(id),
        RawBoard::from_row,
      )
      .await?
      .map(RawBoard::into_board)
      .transpose()
  }

  async fn get_board_by_slug(&self, slug: &str) -> Result<Option<JobBoard>> {
    self
      .select_one(
        format!("SELECT {BOARD_COLUMNS} FROM job_boards WHERE slug = ?1"),
        slug.to_owned(),
        RawBoard::from_row,
      )
      .await?
      .map(RawBoard::into_board)
      .transpose()
  }

  async fn list_boards(&self, public_only: bool) -> Result<Vec<JobBoard>> {
    let filter = if public_only { "WHERE is_public = 1" } else { "" };
    self
      .select_many(
        format!("SELECT {BOARD_COLUMNS} FROM job_boards {filter} ORDER BY name COLLATE NOCASE"),
        vec![],
        RawBoard::from_row,
      )
      .await?
      .into_iter()
      .map(RawBoard::into_board)
      .collect()
  }

  async fn update_board(&self, id: Uuid, update: BoardUpdate) -> Result<Option<JobBoard>> {
    let (set_description, description) = match update.description {
      Some(d) => (Some("1".to_owned()), d),
      None => (None, None),
    };
    let changed = self
      .execute(
        "UPDATE job_boards SET
           name        = COALESCE(?2, name),
           slug        = COALESCE(?3, slug),
           description = CASE WHEN ?4 IS NULL THEN description ELSE ?5 END,
           is_public   = COALESCE(CAST(?6 AS INTEGER), is_public),
           updated_at  = ?7
         WHERE board_id = ?1"
          .to_owned(),
        vec![
          Some(encode_uuid(id)),
          update.name,
          update.slug,
          set_description,
          description,
          update.is_public.map(|p| if p { "1" } else { "0" }.to_owned()),
          Some(encode_dt(Utc::now())),
        ],
      )
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_board(id).await
  }

  async fn delete_board(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM job_boards WHERE board_id = ?1".to_owned(),
        vec![Some(encode_uuid(id))],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn assign_jobs(&self, board_id: Uuid, job_ids: Vec<Uuid>) -> Result<u64> {
    let board = encode_uuid(board_id);
    let ids   = encode_uuids(&job_ids);
    let now   = encode_dt(Utc::now());

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          // Selecting from `jobs` silently skips unknown ids.
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO board_jobs (board_id, job_id, assigned_at)
             SELECT ?1, job_id, ?3 FROM jobs WHERE job_id = ?2",
          )?;
          for id in &ids {
            added += stmt.execute(rusqlite::params![board, id, now])?;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added as u64)
  }

  async fn unassign_job(&self, board_id: Uuid, job_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM board_jobs WHERE board_id = ?1 AND job_id = ?2".to_owned(),
        vec![Some(encode_uuid(board_id)), Some(encode_uuid(job_id))],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn assign_organizations(
    &self,
    board_id: Uuid,
    organization_ids: Vec<Uuid>,
  ) -> Result<u64> {
    let board = encode_uuid(board_id);
    let ids   = encode_uuids(&organization_ids);
    let now   = encode_dt(Utc::now());

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut added = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO board_organizations
               (board_id, organization_id, assigned_at)
             SELECT ?1, organization_id, ?3 FROM organizations
             WHERE organization_id = ?2",
          )?;
          for id in &ids {
            added += stmt.execute(rusqlite::params![board, id, now])?;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added as u64)
  }

  async fn unassign_organization(&self, board_id: Uuid, organization_id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM board_organizations WHERE board_id = ?1 AND organization_id = ?2"
          .to_owned(),
        vec![Some(encode_uuid(board_id)), Some(encode_uuid(organization_id))],
      )
      .await?;
    Ok(changed > 0)
  }

  // ── Saved queries ─────────────────────────────────────────────────────────

  async fn create_saved_query(&self, input: NewSavedQuery) -> Result<SavedQuery> {
    let now = Utc::now();
    let query = SavedQuery {
      saved_query_id: Uuid::new_v4(),
      name:           input.name,
      description:    input.description,
      params:         input.params,
      last_run_at:    None,
      created_at:     now,
      updated_at:     now,
    };

    self
      .execute(
        format!(
          "INSERT INTO saved_queries ({SAVED_QUERY_COLUMNS}) VALUES ({})",
          placeholders(1, 7)
        ),
        vec![
          Some(encode_uuid(query.saved_query_id)),
          Some(query.name.clone()),
          query.description.clone(),
          Some(encode_json(&query.params)?),
          None,
          Some(encode_dt(now)),
          Some(encode_dt(now)),
        ],
      )
      .await?;

    Ok(query)
  }

  async fn get_saved_query(&self, id: Uuid) -> Result<Option<SavedQuery>> {
    self
      .select_one(
        format!("SELECT {SAVED_QUERY_COLUMNS} FROM saved_queries WHERE saved_query_id = ?1"),
        encode_uuid(id),
        RawSavedQuery::from_row,
      )
      .await?
      .map(RawSavedQuery::into_saved_query)
      .transpose()
  }

  async fn list_saved_queries(&self) -> Result<Vec<SavedQuery>> {
    self
      .select_many(
        format!("SELECT {SAVED_QUERY_COLUMNS} FROM saved_queries ORDER BY name COLLATE NOCASE"),
        vec![],
        RawSavedQuery::from_row,
      )
      .await?
      .into_iter()
      .map(RawSavedQuery::into_saved_query)
      .collect()
  }

  async fn update_saved_query(
    &self,
    id: Uuid,
    update: SavedQueryUpdate,
  ) -> Result<Option<SavedQuery>> {
    let (set_description, description) = match update.description {
      Some(d) => (Some("1".to_owned()), d),
      None => (None, None),
    };
    let changed = self
      .execute(
        "UPDATE saved_queries SET
           name        = COALESCE(?2, name),
           description = CASE WHEN ?3 IS NULL THEN description ELSE ?4 END,
           params_json = COALESCE(?5, params_json),
           updated_at  = ?6
         WHERE saved_query_id = ?1"
          .to_owned(),
        vec![
          Some(encode_uuid(id)),
          update.name,
          set_description,
          description,
          update.params.as_ref().map(encode_json).transpose()?,
          Some(encode_dt(Utc::now())),
        ],
      )
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_saved_query(id).await
  }

  async fn delete_saved_query(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM saved_queries WHERE saved_query_id = ?1".to_owned(),
        vec![Some(encode_uuid(id))],
      )
      .await?;
    Ok(changed > 0)
  }

  async fn mark_saved_query_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    self
      .execute(
        "UPDATE saved_queries SET last_run_at = ?2 WHERE saved_query_id = ?1".to_owned(),
        vec![Some(encode_uuid(id)), Some(encode_dt(at))],
      )
      .await?;
    Ok(())
  }

  // ── API tokens ────────────────────────────────────────────────────────────

  async fn create_api_token(&self, input: NewApiToken) -> Result<ApiToken> {
    let token = ApiToken {
      token_id:     Uuid::new_v4(),
      name:         input.name,
      token_hash:   input.token_hash,
      expires_at:   input.expires_at,
      last_used_at: None,
      created_at:   Utc::now(),
    };

    self
      .execute(
        format!("INSERT INTO api_tokens ({TOKEN_COLUMNS}) VALUES ({})", placeholders(1, 6)),
        vec![
          Some(encode_uuid(token.token_id)),
          Some(token.name.clone()),
          Some(token.token_hash.clone()),
          encode_opt_dt(token.expires_at),
          None,
          Some(encode_dt(token.created_at)),
        ],
      )
      .await?;

    Ok(token)
  }

  async fn find_api_token_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>> {
    self
      .select_one(
        format!("SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE token_hash = ?1"),
        token_hash.to_owned(),
        RawApiToken::from_row,
      )
      .await?
      .map(RawApiToken::into_token)
      .transpose()
  }

  async fn touch_api_token(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    self
      .execute(
        "UPDATE api_tokens SET last_used_at = ?2 WHERE token_id = ?1".to_owned(),
        vec![Some(encode_uuid(id)), Some(encode_dt(at))],
      )
      .await?;
    Ok(())
  }

  async fn list_api_tokens(&self) -> Result<Vec<ApiToken>> {
    self
      .select_many(
        format!("SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC"),
        vec![],
        RawApiToken::from_row,
      )
      .await?
      .into_iter()
      .map(RawApiToken::into_token)
      .collect()
  }

  async fn delete_api_token(&self, id: Uuid) -> Result<bool> {
    let changed = self
      .execute(
        "DELETE FROM api_tokens WHERE token_id = ?1".to_owned(),
        vec![Some(encode_uuid(id))],
      )
      .await?;
    Ok(changed > 0)
  }

  // ── Users and sessions ────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      password_hash: input.password_hash,
      is_admin:      input.is_admin,
      created_at:    Utc::now(),
    };

    self
      .execute(
        format!("INSERT INTO users ({USER_COLUMNS}) VALUES ({})", placeholders(1, 5)),
        vec![
          Some(encode_uuid(user.user_id)),
          Some(user.email.clone()),
          Some(user.password_hash.clone()),
          Some(if user.is_admin { "1" } else { "0" }.to_owned()),
          Some(encode_dt(user.created_at)),
        ],
      )
      .await?;

    Ok(user)
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self
      .select_one(
        format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        email.to_owned(),
        |row| RawUser::from_row_at(row, 0),
      )
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<Session> {
    let session = Session {
      session_id: Uuid::new_v4(),
      user_id,
      token_hash,
      expires_at,
      created_at: Utc::now(),
    };

    self
      .execute(
        "INSERT INTO sessions (session_id, user_id, token_hash, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)"
          .to_owned(),
        vec![
          Some(encode_uuid(session.session_id)),
          Some(encode_uuid(user_id)),
          Some(session.token_hash.clone()),
          Some(encode_dt(expires_at)),
          Some(encode_dt(session.created_at)),
        ],
      )
      .await?;

    Ok(session)
  }

  async fn find_session(&self, token_hash: &str) -> Result<Option<(Session, User)>> {
    let found = self
      .select_one(
        "SELECT s.session_id, s.user_id, s.token_hash, s.expires_at, s.created_at,
                u.user_id, u.email, u.password_hash, u.is_admin, u.created_at
         FROM sessions s
         JOIN users u ON u.user_id = s.user_id
         WHERE s.token_hash = ?1"
          .to_owned(),
        token_hash.to_owned(),
        |row| {
          Ok((
            RawSession {
              session_id: row.get(0)?,
              user_id:    row.get(1)?,
              token_hash: row.get(2)?,
              expires_at: row.get(3)?,
              created_at: row.get(4)?,
            },
            RawUser::from_row_at(row, 5)?,
          ))
        },
      )
      .await?;

    found
      .map(|(s, u)| Ok((s.into_session()?, u.into_user()?)))
      .transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    self
      .execute(
        "DELETE FROM sessions WHERE token_hash = ?1".to_owned(),
        vec![Some(token_hash.to_owned())],
      )
      .await?;
    Ok(())
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<Stats> {
    let now = encode_dt(Utc::now());
    let (total, active, remote, orgs, boards, last_fetch): (
      i64,
      i64,
      i64,
      i64,
      i64,
      Option<String>,
    ) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM jobs),
             (SELECT COUNT(*) FROM jobs
               WHERE expired_at IS NULL
                 AND (valid_through IS NULL OR valid_through > ?1)),
             (SELECT COUNT(*) FROM jobs
               WHERE remote = 1 AND expired_at IS NULL
                 AND (valid_through IS NULL OR valid_through > ?1)),
             (SELECT COUNT(*) FROM organizations),
             (SELECT COUNT(*) FROM job_boards),
             (SELECT MAX(created_at) FROM fetch_logs)",
          [now],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )?)
      })
      .await?;

    Ok(Stats {
      total_jobs:    total as u64,
      active_jobs:   active as u64,
      remote_jobs:   remote as u64,
      organizations: orgs as u64,
      boards:        boards as u64,
      last_fetch_at: decode_opt_dt(last_fetch.as_deref())?,
    })
  }
}

