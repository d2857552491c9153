use std::sync::Arc;

use store::backend::{GithubBackend, GithubConfig};
use store::{Bootstrap, BootstrapError, RepoClient};

use super::clock::SystemClock;
use super::config::Config;
use super::credentials::{CredentialCache, FileStore};
use super::lifecycle::Lifecycle;
use super::security::{AbuseTracker, RateLimiter, SecurityManager};

/// Main application state - orchestrates all components
#[derive(Clone)]
pub struct State {
    client: RepoClient,
    lifecycle: Lifecycle,
    credentials: Arc<CredentialCache>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("backend setup failed: {0}")]
    Backend(String),
    #[error("repository bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("local store setup failed: {0}")]
    LocalStore(#[from] std::io::Error),
    #[error("no writable data directory for the local store")]
    NoDataDir,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Backend and client
        let backend = GithubBackend::new(GithubConfig::new(
            config.github_token.clone(),
            config.repo_owner.clone(),
            config.repo_name.clone(),
            config.repo_branch.clone(),
        ))
        .map_err(|e| StateSetupError::Backend(e.to_string()))?;
        let client = RepoClient::new(Arc::new(backend));
        tracing::info!(
            owner = %config.repo_owner,
            repo = %config.repo_name,
            branch = %config.repo_branch,
            "repository client ready"
        );

        // 2. Make sure the directory skeleton exists
        Bootstrap::new(client.clone()).ensure_skeleton().await?;

        // 3. Security gate
        let clock = Arc::new(SystemClock);
        let security = SecurityManager::new(
            RateLimiter::new(clock.clone()),
            AbuseTracker::new(client.clone(), clock.clone()),
        );

        // 4. Domain operations
        let lifecycle = Lifecycle::new(client.clone(), security, clock.clone());

        // 5. Client-side credential cache
        let store_path = match config.local_store_path.clone() {
            Some(path) => path,
            None => FileStore::default_path().ok_or(StateSetupError::NoDataDir)?,
        };
        tracing::debug!(path = %store_path.display(), "opening local credential store");
        let credentials = Arc::new(CredentialCache::new(
            Arc::new(FileStore::open(store_path)?),
            clock,
        ));

        Ok(Self {
            client,
            lifecycle,
            credentials,
        })
    }

    pub fn client(&self) -> &RepoClient {
        &self.client
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }
}
