//! Idempotent directory skeleton creation
//!
//! The contents API has no empty directories; a directory exists once a
//! file under it does. `ensure` creates a `.keep` marker for each missing
//! prefix of a path, parent first. Concurrent calls for the same prefix are
//! deduplicated through a per-path `OnceCell`, so exactly one caller
//! performs the creation and the rest await its result.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::client::{RepoClient, StoreError};
use crate::paths;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Directory manager owning the dedup map and an existence cache
#[derive(Debug, Clone)]
pub struct Bootstrap {
    client: RepoClient,
    cells: Arc<Mutex<HashMap<String, Arc<OnceCell<()>>>>>,
}

impl Bootstrap {
    pub fn new(client: RepoClient) -> Self {
        Self {
            client,
            cells: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Ensure every prefix of `path` exists, parent first
    ///
    /// Cheap after the first call: an initialized cell short-circuits
    /// without touching the backend.
    pub async fn ensure(&self, path: &str) -> Result<(), BootstrapError> {
        let mut prefix = String::new();
        for segment in path.trim_matches('/').split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            self.ensure_dir(&prefix).await?;
        }
        Ok(())
    }

    /// Ensure the fixed top-level skeleton exists
    pub async fn ensure_skeleton(&self) -> Result<(), BootstrapError> {
        for dir in paths::SKELETON {
            self.ensure(dir).await?;
        }
        Ok(())
    }

    async fn ensure_dir(&self, dir: &str) -> Result<(), BootstrapError> {
        let cell = {
            let mut cells = self.cells.lock();
            cells.entry(dir.to_string()).or_default().clone()
        };

        cell.get_or_try_init(|| async {
            let marker = paths::keep_marker(dir);
            if self.client.exists(&marker).await? {
                return Ok(());
            }
            tracing::debug!(dir, "creating directory marker");
            match self
                .client
                .create(&marker, &serde_json::json!({}), &format!("ensure {}", dir))
                .await
            {
                Ok(_) => Ok(()),
                // someone else created it between the check and the write
                Err(StoreError::Conflict) => Ok(()),
                Err(e) => Err(BootstrapError::from(e)),
            }
        })
        .await?;
        Ok(())
    }
}
