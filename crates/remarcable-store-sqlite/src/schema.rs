//! SQL schema for the Remarcable SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS organizations (
    organization_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    url             TEXT,
    domain          TEXT,            -- normalized bare host
    logo            TEXT,
    linkedin_slug   TEXT,
    linkedin_url    TEXT,
    linkedin_json   TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

-- external_id is the idempotency key for ingestion.
CREATE TABLE IF NOT EXISTS jobs (
    job_id           TEXT PRIMARY KEY,
    external_id      TEXT NOT NULL UNIQUE,
    organization_id  TEXT NOT NULL
                     REFERENCES organizations(organization_id) ON DELETE CASCADE,
    title            TEXT NOT NULL,
    url              TEXT,
    date_posted      TEXT,
    date_created     TEXT,
    valid_through    TEXT,
    description      TEXT,
    location_json    TEXT NOT NULL DEFAULT '{}',
    remote           INTEGER,        -- NULL when unknown
    employment_types TEXT NOT NULL DEFAULT '[]',
    salary_raw       TEXT,           -- opaque upstream JSON
    source           TEXT,
    source_type      TEXT,
    source_domain    TEXT,
    ai_json          TEXT,
    expired_at       TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS job_boards (
    board_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT,
    is_public   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS board_jobs (
    board_id    TEXT NOT NULL REFERENCES job_boards(board_id) ON DELETE CASCADE,
    job_id      TEXT NOT NULL REFERENCES jobs(job_id)         ON DELETE CASCADE,
    assigned_at TEXT NOT NULL,
    PRIMARY KEY (board_id, job_id)
);

CREATE TABLE IF NOT EXISTS board_organizations (
    board_id        TEXT NOT NULL REFERENCES job_boards(board_id) ON DELETE CASCADE,
    organization_id TEXT NOT NULL
                    REFERENCES organizations(organization_id) ON DELETE CASCADE,
    assigned_at     TEXT NOT NULL,
    PRIMARY KEY (board_id, organization_id)
);

CREATE TABLE IF NOT EXISTS saved_queries (
    saved_query_id TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT,
    params_json    TEXT NOT NULL,
    last_run_at    TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Fetch logs are append-only.
CREATE TABLE IF NOT EXISTS fetch_logs (
    fetch_log_id   TEXT PRIMARY KEY,
    status         TEXT NOT NULL,    -- 'success' | 'partial' | 'error'
    jobs_fetched   INTEGER NOT NULL DEFAULT 0,
    jobs_created   INTEGER NOT NULL DEFAULT 0,
    jobs_updated   INTEGER NOT NULL DEFAULT 0,
    orgs_created   INTEGER NOT NULL DEFAULT 0,
    orgs_updated   INTEGER NOT NULL DEFAULT 0,
    params_json    TEXT NOT NULL,
    error_message  TEXT,
    duration_ms    INTEGER NOT NULL,
    saved_query_id TEXT REFERENCES saved_queries(saved_query_id) ON DELETE SET NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS api_tokens (
    token_id     TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    token_hash   TEXT NOT NULL UNIQUE,  -- hex SHA-256 of the secret
    expires_at   TEXT,
    last_used_at TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    token_hash TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS organizations_slug_idx
    ON organizations(linkedin_slug COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS organizations_domain_idx ON organizations(domain);
CREATE INDEX IF NOT EXISTS jobs_organization_idx    ON jobs(organization_id);
CREATE INDEX IF NOT EXISTS jobs_posted_idx          ON jobs(date_posted);
CREATE INDEX IF NOT EXISTS fetch_logs_created_idx   ON fetch_logs(created_at);

PRAGMA user_version = 1;
";
