//! Repository client: conditional writes with conflict retry
//!
//! Wraps a [`ContentBackend`] with the policies that make the contents API
//! safe to use as a data store:
//!
//! - a bounded concurrency gate (default 3 permits, FIFO) so bursts respect
//!   upstream rate limits
//! - a fixed per-call deadline (default 10 s); exceeding it surfaces
//!   [`StoreError::Timeout`] without cancelling the backend side effect,
//!   so a timed-out write may still have landed
//! - conflict retry with exponential backoff for writes where re-applying
//!   is safe: blind puts re-peek the version token, [`RepoClient::update`]
//!   re-reads and re-applies the caller's mutation. Conditional puts with a
//!   caller-supplied token and duplicate creates surface the conflict
//!   immediately, because there the conflict is the answer.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Semaphore;

use crate::backend::{BackendError, ContentBackend, RawEntry};
use crate::version::VersionToken;

/// Simultaneous outbound calls allowed through the gate
const DEFAULT_MAX_IN_FLIGHT: usize = 3;
/// Deadline applied to every backend call
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
/// Total attempts for retryable conflicts
const CONFLICT_ATTEMPTS: u32 = 3;
/// First backoff delay; doubles per attempt
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Backoff ceiling
const BACKOFF_CAP: Duration = Duration::from_secs(8);

/// Errors surfaced by the repository client
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional write lost the compare-and-swap after retries
    #[error("version conflict")]
    Conflict,
    /// The caller required a document that does not exist
    #[error("document not found")]
    NotFound,
    /// The call exceeded its deadline; the side effect may still have landed
    #[error("backend call timed out")]
    Timeout,
    /// Non-2xx upstream response; detail is logged, never carried
    #[error("upstream error (status {status})")]
    Upstream { status: u16 },
    #[error("document failed to decode: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store error: {0}")]
    Default(#[from] anyhow::Error),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Conflict => StoreError::Conflict,
            BackendError::NotFound => StoreError::NotFound,
            BackendError::Upstream { status, detail } => {
                tracing::debug!(status, detail, "upstream error");
                StoreError::Upstream { status }
            }
            BackendError::Default(e) => StoreError::Default(e),
        }
    }
}

/// A fetched, decoded document plus the token needed to replace it
#[derive(Debug, Clone)]
pub struct Document<T> {
    pub body: T,
    pub version: VersionToken,
}

/// Directory listing entry
pub type Entry = RawEntry;

/// The repository client; cheap to clone, safe to share
#[derive(Debug, Clone)]
pub struct RepoClient {
    backend: Arc<dyn ContentBackend>,
    gate: Arc<Semaphore>,
    timeout: Duration,
}

impl RepoClient {
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self::with_limits(backend, DEFAULT_MAX_IN_FLIGHT, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_limits(
        backend: Arc<dyn ContentBackend>,
        max_in_flight: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            gate: Arc::new(Semaphore::new(max_in_flight)),
            timeout,
        }
    }

    /// Run one backend call through the gate and the deadline
    async fn call<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, BackendError>>,
    {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("concurrency gate closed"))?;
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StoreError::Timeout),
        }
    }

    /// Fetch and decode a document; absence is `None`, never an error
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<Document<T>>, StoreError> {
        let raw = self.call(self.backend.fetch(path)).await?;
        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(Document {
                body: serde_json::from_slice(&raw.bytes)?,
                version: raw.version,
            })),
        }
    }

    /// Current version token of a document, if it exists
    pub async fn peek(&self, path: &str) -> Result<Option<VersionToken>, StoreError> {
        let raw = self.call(self.backend.fetch(path)).await?;
        Ok(raw.map(|r| r.version))
    }

    pub async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.peek(path).await?.is_some())
    }

    /// Create a document; a conflict here means it already exists and is
    /// surfaced for the caller to decide
    pub async fn create<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let bytes = serde_json::to_vec_pretty(body)?;
        Ok(self
            .call(self.backend.write(path, &bytes, message, None))
            .await?)
    }

    /// Conditional write
    ///
    /// With `expected: Some`, the compare-and-swap is the caller's and a
    /// conflict is surfaced immediately. With `expected: None`, the client
    /// peeks the current token first (so updates always attach one) and
    /// retries the peek-and-write on conflict up to the bound; this is
    /// last-writer-wins by construction and callers who need merge
    /// semantics use [`RepoClient::update`] instead.
    pub async fn put<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        message: &str,
        expected: Option<VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        let bytes = serde_json::to_vec_pretty(body)?;

        if let Some(token) = expected {
            return Ok(self
                .call(self.backend.write(path, &bytes, message, Some(&token)))
                .await?);
        }

        let mut attempt = 0;
        loop {
            let current = self.peek(path).await?;
            let result = self
                .call(self.backend.write(path, &bytes, message, current.as_ref()))
                .await;
            match result {
                Ok(token) => return Ok(token),
                Err(StoreError::Conflict) if current.is_some() && attempt + 1 < CONFLICT_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(path, attempt, "write conflict, backing off");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read-modify-write with conflict retry
    ///
    /// Loads the document, applies `mutate`, writes it back under the
    /// loaded token. On conflict the document is re-read and the mutation
    /// re-applied to the fresh state, so counter-style updates are never
    /// lost to a concurrent writer. Fails with [`StoreError::NotFound`] if
    /// the document does not exist.
    pub async fn update<T, F>(
        &self,
        path: &str,
        message: &str,
        mut mutate: F,
    ) -> Result<(T, VersionToken), StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(T) -> Result<T, StoreError>,
    {
        let mut attempt = 0;
        loop {
            let doc: Document<T> = self.get(path).await?.ok_or(StoreError::NotFound)?;
            let mutated = mutate(doc.body)?;
            let bytes = serde_json::to_vec_pretty(&mutated)?;
            let result = self
                .call(self.backend.write(path, &bytes, message, Some(&doc.version)))
                .await;
            match result {
                Ok(token) => return Ok((mutated, token)),
                Err(StoreError::Conflict) if attempt + 1 < CONFLICT_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(path, attempt, "update conflict, re-reading");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Conditional delete; already-missing documents are success
    pub async fn delete(
        &self,
        path: &str,
        message: &str,
        expected: Option<VersionToken>,
    ) -> Result<(), StoreError> {
        let mut attempt = 0;
        let mut token = expected;
        loop {
            let current = match token.take() {
                Some(token) => token,
                None => match self.peek(path).await? {
                    Some(token) => token,
                    // idempotent tear-down
                    None => return Ok(()),
                },
            };
            let result = self.call(self.backend.remove(path, message, &current)).await;
            match result {
                Ok(()) => return Ok(()),
                Err(StoreError::NotFound) => return Ok(()),
                Err(StoreError::Conflict) if attempt + 1 < CONFLICT_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(path, attempt, "delete conflict, re-peeking");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// List entries under a path; a missing directory is an empty list
    pub async fn list(&self, path: &str) -> Result<Vec<Entry>, StoreError> {
        let entries = self.call(self.backend.list(path)).await?;
        Ok(entries.unwrap_or_default())
    }
}

fn backoff(attempt: u32) -> Duration {
    let delay = BACKOFF_BASE.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    delay.min(BACKOFF_CAP)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        likes: u64,
    }

    fn client(backend: &MemoryBackend) -> RepoClient {
        RepoClient::with_limits(
            Arc::new(backend.clone()),
            3,
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let backend = MemoryBackend::new();
        let client = client(&backend);
        let doc: Option<Document<Counter>> = client.get("missing.json").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_create_then_update_roundtrip() {
        let backend = MemoryBackend::new();
        let client = client(&backend);

        let token = client
            .create("c.json", &Counter { likes: 0 }, "create")
            .await
            .unwrap();
        let doc: Document<Counter> = client.get("c.json").await.unwrap().unwrap();
        assert_eq!(doc.version, token);

        client
            .put("c.json", &Counter { likes: 5 }, "update", Some(token))
            .await
            .unwrap();
        let doc: Document<Counter> = client.get("c.json").await.unwrap().unwrap();
        assert_eq!(doc.body.likes, 5);
    }

    #[tokio::test]
    async fn test_duplicate_create_surfaces_conflict() {
        let backend = MemoryBackend::new();
        let client = client(&backend);
        client
            .create("c.json", &Counter { likes: 0 }, "create")
            .await
            .unwrap();
        let result = client.create("c.json", &Counter { likes: 1 }, "create").await;
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_increments_both_land() {
        let backend = MemoryBackend::new();
        let client = client(&backend);
        client
            .create("c.json", &Counter { likes: 0 }, "create")
            .await
            .unwrap();

        let a = client.clone();
        let b = client.clone();
        let (ra, rb) = tokio::join!(
            a.update::<Counter, _>("c.json", "like", |mut c| {
                c.likes += 1;
                Ok(c)
            }),
            b.update::<Counter, _>("c.json", "like", |mut c| {
                c.likes += 1;
                Ok(c)
            }),
        );
        ra.unwrap();
        rb.unwrap();

        let doc: Document<Counter> = client.get("c.json").await.unwrap().unwrap();
        assert_eq!(doc.body.likes, 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        let client = client(&backend);
        client
            .create("c.json", &Counter { likes: 0 }, "create")
            .await
            .unwrap();
        client.delete("c.json", "delete", None).await.unwrap();
        // second delete of the same path is still success
        client.delete("c.json", "delete", None).await.unwrap();
        assert!(!client.exists("c.json").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let backend = MemoryBackend::new();
        backend.seed("c.json", b"{\"likes\":0}".to_vec());
        backend.set_latency(Some(Duration::from_secs(60)));
        let client = client(&backend);

        let result: Result<Option<Document<Counter>>, _> = client.get("c.json").await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let client = client(&backend);
        let result = client
            .update::<Counter, _>("missing.json", "like", |c| Ok(c))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
