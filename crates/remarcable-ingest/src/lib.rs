//! Ingestion pipeline for the fantastic-jobs search API.
//!
//! - [`query::QueryBuilder`] turns typed filters into the flat parameter map
//!   the upstream API expects.
//! - [`client::FantasticJobsClient`] performs the authenticated HTTP calls with
//!   retry and backoff.
//! - [`fetcher::JobsFetcher`] runs one fetch, resolves organizations, upserts
//!   jobs and writes the fetch log.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod mapper;
pub mod query;
pub mod types;

pub use client::{ClientConfig, FantasticJobsClient, JobSource, RetryPolicy};
pub use error::{ClientError, FetchError, QueryError};
pub use fetcher::{FetchSummary, JobsFetcher};
pub use query::{QueryBuilder, TimeWindow};
