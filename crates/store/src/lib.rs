//! Contents-API storage for draftbox
//!
//! This crate turns a Git-hosted contents endpoint (whole-file GET/PUT/DELETE
//! with an opaque version token, no transactions) into a usable multi-writer
//! document store:
//!
//! - [`backend::ContentBackend`] abstracts the raw transport. Two
//!   implementations ship: [`backend::GithubBackend`] against the real
//!   contents API and [`backend::MemoryBackend`] for tests, which reproduces
//!   the API's conflict semantics in-process.
//! - [`RepoClient`] layers conditional writes, bounded concurrency, per-call
//!   timeouts and conflict retry with backoff on top of a backend.
//! - [`Bootstrap`] idempotently creates the fixed directory skeleton,
//!   deduplicating concurrent creation attempts.
//! - [`paths`] is the single source of truth for where entities live.

pub mod backend;
mod bootstrap;
mod client;
pub mod paths;
mod version;

pub use bootstrap::{Bootstrap, BootstrapError};
pub use client::{Document, Entry, RepoClient, StoreError};
pub use version::VersionToken;
