//! In-memory backend for tests
//!
//! Reproduces the contents API's semantics in-process: opaque monotonic
//! version tokens, conflicts on token mismatch and on create-over-existing,
//! directory listings derived from path prefixes. An optional artificial
//! latency makes timeout behavior testable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{BackendError, ContentBackend, RawDocument, RawEntry};
use crate::version::VersionToken;

#[derive(Debug, Default)]
struct MemoryBackendInner {
    /// path -> (bytes, version counter)
    documents: HashMap<String, (Vec<u8>, u64)>,
    next_version: u64,
    latency: Option<Duration>,
    write_count: u64,
}

/// In-memory [`ContentBackend`]
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryBackendInner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, simulating a slow upstream
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.write().expect("lock poisoned").latency = latency;
    }

    /// Number of successful writes, for asserting on retry behavior
    pub fn write_count(&self) -> u64 {
        self.inner.read().expect("lock poisoned").write_count
    }

    /// Direct insert bypassing conflict checks, for test setup
    pub fn seed(&self, path: &str, bytes: Vec<u8>) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.next_version += 1;
        let version = inner.next_version;
        inner.documents.insert(path.to_string(), (bytes, version));
    }

    async fn simulate_latency(&self) {
        let latency = self.inner.read().expect("lock poisoned").latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn token(counter: u64) -> VersionToken {
        VersionToken::new(format!("v{}", counter))
    }
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    async fn fetch(&self, path: &str) -> Result<Option<RawDocument>, BackendError> {
        self.simulate_latency().await;
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.documents.get(path).map(|(bytes, version)| RawDocument {
            bytes: bytes.clone(),
            version: Self::token(*version),
        }))
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        _message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, BackendError> {
        self.simulate_latency().await;
        let mut inner = self.inner.write().expect("lock poisoned");
        match (inner.documents.get(path), expected) {
            // create: must not already exist
            (Some(_), None) => return Err(BackendError::Conflict),
            // update: token must match the current one
            (Some((_, current)), Some(token)) => {
                if Self::token(*current) != *token {
                    return Err(BackendError::Conflict);
                }
            }
            // update of a missing document
            (None, Some(_)) => return Err(BackendError::NotFound),
            (None, None) => {}
        }
        inner.next_version += 1;
        inner.write_count += 1;
        let version = inner.next_version;
        inner
            .documents
            .insert(path.to_string(), (bytes.to_vec(), version));
        Ok(Self::token(version))
    }

    async fn remove(
        &self,
        path: &str,
        _message: &str,
        expected: &VersionToken,
    ) -> Result<(), BackendError> {
        self.simulate_latency().await;
        let mut inner = self.inner.write().expect("lock poisoned");
        match inner.documents.get(path) {
            None => Err(BackendError::NotFound),
            Some((_, current)) if Self::token(*current) != *expected => {
                Err(BackendError::Conflict)
            }
            Some(_) => {
                inner.documents.remove(path);
                Ok(())
            }
        }
    }

    async fn list(&self, path: &str) -> Result<Option<Vec<RawEntry>>, BackendError> {
        self.simulate_latency().await;
        let inner = self.inner.read().expect("lock poisoned");
        let prefix = format!("{}/", path.trim_end_matches('/'));

        let mut entries: Vec<RawEntry> = Vec::new();
        for key in inner.documents.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let entry = match rest.split_once('/') {
                Some((dir, _)) => RawEntry {
                    name: dir.to_string(),
                    is_dir: true,
                },
                None => RawEntry {
                    name: rest.to_string(),
                    is_dir: false,
                },
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }

        if entries.is_empty() {
            return Ok(None);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some(entries))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_create_then_fetch() {
        let backend = MemoryBackend::new();
        let token = backend.write("a/b.json", b"{}", "create", None).await.unwrap();
        let doc = backend.fetch("a/b.json").await.unwrap().unwrap();
        assert_eq!(doc.bytes, b"{}");
        assert_eq!(doc.version, token);
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let backend = MemoryBackend::new();
        backend.write("a.json", b"1", "create", None).await.unwrap();
        let result = backend.write("a.json", b"2", "create", None).await;
        assert!(matches!(result, Err(BackendError::Conflict)));
    }

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let backend = MemoryBackend::new();
        let stale = backend.write("a.json", b"1", "create", None).await.unwrap();
        backend
            .write("a.json", b"2", "update", Some(&stale))
            .await
            .unwrap();
        let result = backend.write("a.json", b"3", "update", Some(&stale)).await;
        assert!(matches!(result, Err(BackendError::Conflict)));
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let result = backend
            .remove("gone.json", "delete", &VersionToken::new("v1"))
            .await;
        assert!(matches!(result, Err(BackendError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_splits_files_and_dirs() {
        let backend = MemoryBackend::new();
        backend.seed("folders/active/a.json", b"{}".to_vec());
        backend.seed("folders/active/b.json", b"{}".to_vec());
        backend.seed("folders/active/sub/c.json", b"{}".to_vec());

        let entries = backend.list("folders/active").await.unwrap().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().any(|e| e.name == "a.json" && !e.is_dir));
        assert!(entries.iter().any(|e| e.name == "sub" && e.is_dir));

        assert!(backend.list("folders/silent").await.unwrap().is_none());
    }
}
