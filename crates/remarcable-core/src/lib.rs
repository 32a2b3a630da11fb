//! Core types and trait definitions for the Remarcable job board.
//!
//! No HTTP or database dependencies live here; the store, ingest and API
//! crates all build on these types.

#![allow(async_fn_in_trait)]

pub mod access;
pub mod board;
pub mod error;
pub mod fetch_log;
pub mod job;
pub mod organization;
pub mod page;
pub mod saved_query;
pub mod store;

pub use error::{Error, Result};
