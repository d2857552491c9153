//! Raw transport behind the repository client
//!
//! A [`ContentBackend`] speaks whole-file GET/PUT/DELETE/LIST with opaque
//! version tokens and nothing else. All error discrimination happens here,
//! once, where the raw response is parsed; upper layers only ever see typed
//! variants, never response text.

mod github;
mod memory;

use async_trait::async_trait;

pub use github::{GithubBackend, GithubConfig};
pub use memory::MemoryBackend;

use crate::version::VersionToken;

/// Errors surfaced by a backend call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The supplied version token did not match the document's current one
    #[error("version conflict")]
    Conflict,
    /// The document to mutate does not exist
    #[error("document not found")]
    NotFound,
    /// Any other non-2xx response
    #[error("upstream error (status {status})")]
    Upstream { status: u16, detail: String },
    #[error("backend error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A fetched document: raw bytes plus the token needed to replace it
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

/// A directory listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Whole-file storage with compare-and-swap writes
///
/// Contract, matching the contents API it fronts:
///
/// - `fetch` returns `Ok(None)` when the path does not exist; absence is
///   never an error
/// - `write` with `expected: None` creates; with `Some(token)` replaces,
///   failing with [`BackendError::Conflict`] if the current token differs.
///   Creating over an existing document is also a `Conflict` (existence
///   itself is the authority)
/// - `remove` requires the current token and fails with `NotFound` if the
///   document is already gone (idempotence is the caller's policy)
/// - `list` returns `Ok(None)` for a missing directory
#[async_trait]
pub trait ContentBackend: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, path: &str) -> Result<Option<RawDocument>, BackendError>;

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, BackendError>;

    async fn remove(
        &self,
        path: &str,
        message: &str,
        expected: &VersionToken,
    ) -> Result<(), BackendError>;

    async fn list(&self, path: &str) -> Result<Option<Vec<RawEntry>>, BackendError>;
}
