//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use remarcable_core::{
  access::{NewApiToken, NewUser},
  board::{BoardUpdate, NewBoard},
  fetch_log::{FetchCounts, FetchStatus, NewFetchLog},
  job::{JobLocation, NewJob},
  organization::{LinkedinProfile, NewOrganization, OrganizationPatch},
  page::PageRequest,
  saved_query::{NewSavedQuery, SavedQueryUpdate},
  store::{JobQuery, JobStore, OrganizationQuery},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn org_named(name: &str) -> NewOrganization {
  NewOrganization { name: name.into(), ..Default::default() }
}

async fn seed_org(s: &SqliteStore, name: &str) -> Uuid {
  s.create_organization(org_named(name))
    .await
    .unwrap()
    .organization_id
}

async fn seed_job(s: &SqliteStore, org: Uuid, external_id: &str, title: &str) -> Uuid {
  s.create_job(NewJob::new(external_id, org, title))
    .await
    .unwrap()
    .job_id
}

// ─── Organizations ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_organization() {
  let s = store().await;

  let created = s
    .create_organization(NewOrganization {
      name: "Acme".into(),
      domain: Some("acme.io".into()),
      linkedin_slug: Some("acme".into()),
      linkedin: LinkedinProfile {
        industry: Some("Software".into()),
        specialties: vec!["rust".into()],
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();

  let fetched = s
    .get_organization(created.organization_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.name, "Acme");
  assert_eq!(fetched.linkedin.industry.as_deref(), Some("Software"));
  assert_eq!(fetched.linkedin.specialties, vec!["rust".to_owned()]);
}

#[tokio::test]
async fn find_organization_by_slug_ignores_case() {
  let s = store().await;
  s.create_organization(NewOrganization {
    name: "Acme".into(),
    linkedin_slug: Some("acme-inc".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  let found = s.find_organization_by_slug("ACME-Inc").await.unwrap();
  assert_eq!(found.map(|o| o.name).as_deref(), Some("Acme"));
  assert!(s.find_organization_by_slug("other").await.unwrap().is_none());
}

#[tokio::test]
async fn find_organization_by_domain() {
  let s = store().await;
  s.create_organization(NewOrganization {
    name: "Acme".into(),
    domain: Some("acme.io".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  assert!(s.find_organization_by_domain("acme.io").await.unwrap().is_some());
  assert!(s.find_organization_by_domain("acme.com").await.unwrap().is_none());
}

#[tokio::test]
async fn patch_organization_only_fills_gaps() {
  let s = store().await;
  let org = s
    .create_organization(NewOrganization {
      name: "Acme".into(),
      logo: Some("https://cdn/old.png".into()),
      linkedin: LinkedinProfile { followers: Some(10), ..Default::default() },
      ..Default::default()
    })
    .await
    .unwrap();

  let patched = s
    .patch_organization(
      org.organization_id,
      OrganizationPatch {
        logo:         Some("https://cdn/new.png".into()),
        linkedin_url: Some("https://linkedin.com/company/acme".into()),
        employees:    Some(250),
        followers:    Some(99),
        description:  Some("Widgets".into()),
      },
    )
    .await
    .unwrap();

  assert_eq!(patched.logo.as_deref(), Some("https://cdn/old.png"));
  assert_eq!(
    patched.linkedin_url.as_deref(),
    Some("https://linkedin.com/company/acme")
  );
  assert_eq!(patched.linkedin.employees, Some(250));
  assert_eq!(patched.linkedin.followers, Some(10));
  assert_eq!(patched.linkedin.description.as_deref(), Some("Widgets"));
}

#[tokio::test]
async fn patch_missing_organization_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let result = s.patch_organization(id, OrganizationPatch::default()).await;
  assert!(matches!(result, Err(Error::OrganizationNotFound(missing)) if missing == id));
}

#[tokio::test]
async fn list_organizations_searches_and_pages() {
  let s = store().await;
  for name in ["Alpha Labs", "Beta Labs", "Gamma Corp"] {
    seed_org(&s, name).await;
  }

  let labs = s
    .list_organizations(&OrganizationQuery {
      search: Some("labs".into()),
      page:   PageRequest::new(Some(1), Some(1)),
    })
    .await
    .unwrap();
  assert_eq!(labs.total, 2);
  assert_eq!(labs.items.len(), 1);
  assert_eq!(labs.items[0].name, "Alpha Labs");
}

#[tokio::test]
async fn search_wildcards_match_literally() {
  let s = store().await;
  for name in ["100% Remote", "100 Remote", "Snake_Case Ltd", "SnakeXCase Ltd"] {
    seed_org(&s, name).await;
  }
  let search = |term: &str| OrganizationQuery {
    search: Some(term.into()),
    page:   PageRequest::default(),
  };

  let percent = s.list_organizations(&search("100%")).await.unwrap();
  assert_eq!(percent.total, 1);
  assert_eq!(percent.items[0].name, "100% Remote");

  let underscore = s.list_organizations(&search("e_c")).await.unwrap();
  assert_eq!(underscore.total, 1);
  assert_eq!(underscore.items[0].name, "Snake_Case Ltd");

  let org = seed_org(&s, "Acme").await;
  seed_job(&s, org, "ext-1", "50% travel").await;
  seed_job(&s, org, "ext-2", "50 travel").await;
  let jobs = s
    .list_jobs(&JobQuery { search: Some("50%".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(jobs.total, 1);
  assert_eq!(jobs.items[0].title, "50% travel");
}

#[tokio::test]
async fn delete_organization_cascades_to_jobs() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let job = seed_job(&s, org, "ext-1", "Engineer").await;

  assert_eq!(s.delete_organizations(vec![org]).await.unwrap(), 1);
  assert!(s.get_job(job).await.unwrap().is_none());
  assert_eq!(s.delete_organizations(vec![]).await.unwrap(), 0);
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_job_by_external_id() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;

  let mut input = NewJob::new("ext-42", org, "Rust Engineer");
  input.remote = Some(true);
  input.employment_types = vec!["FULL_TIME".into()];
  input.location = JobLocation {
    countries: vec!["Germany".into()],
    ..Default::default()
  };
  let created = s.create_job(input).await.unwrap();

  let found = s.find_job_by_external_id("ext-42").await.unwrap().unwrap();
  assert_eq!(found.job_id, created.job_id);
  assert_eq!(found.remote, Some(true));
  assert_eq!(found.employment_types, vec!["FULL_TIME".to_owned()]);
  assert_eq!(found.location.countries, vec!["Germany".to_owned()]);
}

#[tokio::test]
async fn duplicate_external_id_is_rejected() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  seed_job(&s, org, "ext-1", "Engineer").await;

  let again = s.create_job(NewJob::new("ext-1", org, "Engineer")).await;
  assert!(matches!(again, Err(Error::Database(_))));
}

#[tokio::test]
async fn update_job_preserves_expiry_and_creation() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let job = seed_job(&s, org, "ext-1", "Engineer").await;
  s.expire_jobs(vec![job]).await.unwrap();
  let before = s.get_job(job).await.unwrap().unwrap();

  let updated = s
    .update_job(job, NewJob::new("ext-1", org, "Senior Engineer"))
    .await
    .unwrap();

  assert_eq!(updated.title, "Senior Engineer");
  assert_eq!(updated.created_at, before.created_at);
  assert_eq!(updated.expired_at, before.expired_at);
  assert!(updated.expired_at.is_some());
}

#[tokio::test]
async fn update_missing_job_errors() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let result = s.update_job(Uuid::new_v4(), NewJob::new("x", org, "t")).await;
  assert!(matches!(result, Err(Error::JobNotFound(_))));
}

#[tokio::test]
async fn list_jobs_hides_expired_by_default() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let live = seed_job(&s, org, "ext-1", "Live").await;
  let expired = seed_job(&s, org, "ext-2", "Expired").await;

  let mut stale = NewJob::new("ext-3", org, "Stale");
  stale.valid_through = Some(Utc::now() - Duration::days(1));
  s.create_job(stale).await.unwrap();

  assert_eq!(s.expire_jobs(vec![expired]).await.unwrap(), 1);
  // Already expired rows are not stamped twice.
  assert_eq!(s.expire_jobs(vec![expired]).await.unwrap(), 0);

  let visible = s.list_jobs(&JobQuery::default()).await.unwrap();
  assert_eq!(visible.total, 1);
  assert_eq!(visible.items[0].job_id, live);

  let all = s
    .list_jobs(&JobQuery { include_expired: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.total, 3);
}

#[tokio::test]
async fn list_jobs_filters() {
  let s = store().await;
  let acme = seed_org(&s, "Acme").await;
  let other = seed_org(&s, "Other").await;

  let mut remote = NewJob::new("ext-1", acme, "Rust Engineer");
  remote.remote = Some(true);
  remote.location.countries = vec!["Germany".into()];
  s.create_job(remote).await.unwrap();

  let mut onsite = NewJob::new("ext-2", other, "Go Engineer");
  onsite.remote = Some(false);
  onsite.location.countries = vec!["France".into()];
  s.create_job(onsite).await.unwrap();

  let by_search = s
    .list_jobs(&JobQuery { search: Some("rust".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_search.total, 1);

  let by_org = s
    .list_jobs(&JobQuery { organization_id: Some(other), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_org.items[0].title, "Go Engineer");

  let by_remote = s
    .list_jobs(&JobQuery { remote: Some(true), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_remote.items[0].title, "Rust Engineer");

  let by_country = s
    .list_jobs(&JobQuery { country: Some("france".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_country.total, 1);
  assert_eq!(by_country.items[0].title, "Go Engineer");
}

#[tokio::test]
async fn list_jobs_pages_newest_first() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  for (i, days_ago) in [3, 1, 2].into_iter().enumerate() {
    let mut job = NewJob::new(format!("ext-{i}"), org, format!("Job {days_ago}"));
    job.date_posted = Some(Utc::now() - Duration::days(days_ago));
    s.create_job(job).await.unwrap();
  }

  let first = s
    .list_jobs(&JobQuery {
      page: PageRequest::new(Some(1), Some(2)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(first.total, 3);
  let titles: Vec<_> = first.items.iter().map(|j| j.title.as_str()).collect();
  assert_eq!(titles, ["Job 1", "Job 2"]);

  let second = s
    .list_jobs(&JobQuery {
      page: PageRequest::new(Some(2), Some(2)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(second.items.len(), 1);
  assert_eq!(second.items[0].title, "Job 3");
}

#[tokio::test]
async fn delete_jobs_counts_removed_rows() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let a = seed_job(&s, org, "ext-1", "A").await;
  let b = seed_job(&s, org, "ext-2", "B").await;

  assert_eq!(s.delete_jobs(vec![a, b, Uuid::new_v4()]).await.unwrap(), 2);
  assert_eq!(s.list_jobs(&JobQuery::default()).await.unwrap().total, 0);
}

// ─── Boards ──────────────────────────────────────────────────────────────────

fn board(slug: &str, is_public: bool) -> NewBoard {
  NewBoard {
    name: slug.to_uppercase(),
    slug: slug.into(),
    description: None,
    is_public,
  }
}

#[tokio::test]
async fn boards_crud() {
  let s = store().await;
  let created = s.create_board(board("rust", true)).await.unwrap();
  s.create_board(board("hidden", false)).await.unwrap();

  assert_eq!(s.list_boards(false).await.unwrap().len(), 2);
  assert_eq!(s.list_boards(true).await.unwrap().len(), 1);
  assert!(s.get_board_by_slug("rust").await.unwrap().is_some());

  let updated = s
    .update_board(
      created.board_id,
      BoardUpdate {
        description: Some(Some("Rust jobs".into())),
        is_public: Some(false),
        ..Default::default()
      },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "RUST");
  assert_eq!(updated.description.as_deref(), Some("Rust jobs"));
  assert!(!updated.is_public);

  let cleared = s
    .update_board(
      created.board_id,
      BoardUpdate { description: Some(None), ..Default::default() },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(cleared.description, None);

  assert!(
    s.update_board(Uuid::new_v4(), BoardUpdate::default())
      .await
      .unwrap()
      .is_none()
  );
  assert!(s.delete_board(created.board_id).await.unwrap());
  assert!(!s.delete_board(created.board_id).await.unwrap());
}

#[tokio::test]
async fn board_shows_assigned_jobs_and_organization_jobs() {
  let s = store().await;
  let acme = seed_org(&s, "Acme").await;
  let other = seed_org(&s, "Other").await;
  let direct = seed_job(&s, other, "ext-1", "Direct").await;
  seed_job(&s, other, "ext-2", "Unassigned").await;
  seed_job(&s, acme, "ext-3", "Via org").await;
  seed_job(&s, acme, "ext-4", "Via org too").await;

  let b = s.create_board(board("rust", true)).await.unwrap().board_id;
  assert_eq!(
    s.assign_jobs(b, vec![direct, Uuid::new_v4()]).await.unwrap(),
    1
  );
  assert_eq!(s.assign_jobs(b, vec![direct]).await.unwrap(), 0);
  assert_eq!(s.assign_organizations(b, vec![acme]).await.unwrap(), 1);

  let on_board = s
    .list_jobs(&JobQuery { board_id: Some(b), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(on_board.total, 3);
  assert!(on_board.items.iter().all(|j| j.title != "Unassigned"));

  assert!(s.unassign_organization(b, acme).await.unwrap());
  assert!(s.unassign_job(b, direct).await.unwrap());
  assert!(!s.unassign_job(b, direct).await.unwrap());
  let empty = s
    .list_jobs(&JobQuery { board_id: Some(b), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(empty.total, 0);
}

// ─── Saved queries and fetch logs ────────────────────────────────────────────

#[tokio::test]
async fn saved_query_lifecycle() {
  let s = store().await;
  let q = s
    .create_saved_query(NewSavedQuery {
      name:        "Rust in EU".into(),
      description: None,
      params:      serde_json::json!({ "title_filter": ["rust"] }),
    })
    .await
    .unwrap();
  assert!(q.last_run_at.is_none());

  let renamed = s
    .update_saved_query(
      q.saved_query_id,
      SavedQueryUpdate { name: Some("Rust".into()), ..Default::default() },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Rust");
  assert_eq!(renamed.params, q.params);

  let at = Utc::now();
  s.mark_saved_query_run(q.saved_query_id, at).await.unwrap();
  let run = s.get_saved_query(q.saved_query_id).await.unwrap().unwrap();
  assert!(run.last_run_at.is_some());

  assert_eq!(s.list_saved_queries().await.unwrap().len(), 1);
  assert!(s.delete_saved_query(q.saved_query_id).await.unwrap());
  assert!(s.get_saved_query(q.saved_query_id).await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_logs_round_trip_and_filter() {
  let s = store().await;
  let q = s
    .create_saved_query(NewSavedQuery {
      name:        "q".into(),
      description: None,
      params:      serde_json::json!({}),
    })
    .await
    .unwrap();

  let recorded = s
    .record_fetch_log(NewFetchLog {
      status:         FetchStatus::Partial,
      counts:         FetchCounts { jobs_fetched: 3, jobs_created: 2, ..Default::default() },
      params:         serde_json::json!({ "limit": "10" }),
      error_message:  Some("1 item failed".into()),
      duration_ms:    1234,
      saved_query_id: Some(q.saved_query_id),
    })
    .await
    .unwrap();
  s.record_fetch_log(NewFetchLog {
    status:         FetchStatus::Error,
    counts:         FetchCounts::default(),
    params:         serde_json::json!({}),
    error_message:  Some("upstream 500".into()),
    duration_ms:    5,
    saved_query_id: None,
  })
  .await
  .unwrap();

  let all = s.list_fetch_logs(None, 10).await.unwrap();
  assert_eq!(all.len(), 2);

  let for_query = s.list_fetch_logs(Some(q.saved_query_id), 10).await.unwrap();
  assert_eq!(for_query.len(), 1);
  assert_eq!(for_query[0].fetch_log_id, recorded.fetch_log_id);
  assert_eq!(for_query[0].status, FetchStatus::Partial);
  assert_eq!(for_query[0].counts.jobs_created, 2);
  assert_eq!(for_query[0].params, recorded.params);

  // Deleting the query keeps its logs.
  s.delete_saved_query(q.saved_query_id).await.unwrap();
  let kept = s.list_fetch_logs(None, 10).await.unwrap();
  assert_eq!(kept.len(), 2);
  assert!(kept.iter().all(|l| l.saved_query_id.is_none()));
}

// ─── Tokens, users and sessions ──────────────────────────────────────────────

#[tokio::test]
async fn api_token_lifecycle() {
  let s = store().await;
  let token = s
    .create_api_token(NewApiToken {
      name:       "partner".into(),
      token_hash: "abc123".into(),
      expires_at: None,
    })
    .await
    .unwrap();

  let found = s.find_api_token_by_hash("abc123").await.unwrap().unwrap();
  assert_eq!(found.token_id, token.token_id);
  assert!(found.last_used_at.is_none());

  s.touch_api_token(token.token_id, Utc::now()).await.unwrap();
  let touched = s.find_api_token_by_hash("abc123").await.unwrap().unwrap();
  assert!(touched.last_used_at.is_some());

  assert_eq!(s.list_api_tokens().await.unwrap().len(), 1);
  assert!(s.delete_api_token(token.token_id).await.unwrap());
  assert!(s.find_api_token_by_hash("abc123").await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_resolve_their_user() {
  let s = store().await;
  let user = s
    .create_user(NewUser {
      email:         "Admin@Example.com".into(),
      password_hash: "$argon2id$stub".into(),
      is_admin:      true,
    })
    .await
    .unwrap();

  let by_email = s.find_user_by_email("admin@example.com").await.unwrap();
  assert_eq!(by_email.map(|u| u.user_id), Some(user.user_id));

  let expires = Utc::now() + Duration::hours(1);
  s.create_session(user.user_id, "session-hash".into(), expires)
    .await
    .unwrap();

  let (session, owner) = s.find_session("session-hash").await.unwrap().unwrap();
  assert_eq!(session.user_id, user.user_id);
  assert!(owner.is_admin);

  s.delete_session("session-hash").await.unwrap();
  assert!(s.find_session("session-hash").await.unwrap().is_none());
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_count_active_and_remote() {
  let s = store().await;
  let org = seed_org(&s, "Acme").await;
  let mut remote = NewJob::new("ext-1", org, "Remote");
  remote.remote = Some(true);
  s.create_job(remote).await.unwrap();
  let gone = seed_job(&s, org, "ext-2", "Gone").await;
  s.expire_jobs(vec![gone]).await.unwrap();
  s.create_board(board("rust", true)).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_jobs, 2);
  assert_eq!(stats.active_jobs, 1);
  assert_eq!(stats.remote_jobs, 1);
  assert_eq!(stats.organizations, 1);
  assert_eq!(stats.boards, 1);
  assert!(stats.last_fetch_at.is_none());
}
