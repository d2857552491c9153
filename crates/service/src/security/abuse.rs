//! Suspicious-activity reports and blacklist promotion
//!
//! Reports are persisted per IP hash so escalation survives process
//! restarts. Promotion is one-way: once a blacklist entry exists, the
//! presence of the document alone denies the hash.

use std::sync::Arc;

use common::models::{BlacklistEntry, PendingReport};
use store::{paths, RepoClient, StoreError};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::security::Action;

#[derive(Debug, Clone)]
pub struct AbuseTracker {
    client: RepoClient,
    clock: Arc<dyn Clock>,
}

impl AbuseTracker {
    pub fn new(client: RepoClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether the hash has been promoted to the hard blacklist
    pub async fn is_blacklisted(&self, ip_hash: &str) -> Result<bool, ServiceError> {
        Ok(self.client.exists(&paths::blacklist_entry(ip_hash)).await?)
    }

    /// File a suspicious-activity report; returns true when this report
    /// promoted the hash onto the blacklist
    pub async fn flag(&self, ip_hash: &str, action: Action) -> Result<bool, ServiceError> {
        let now = self.clock.now();
        let path = paths::pending_report(ip_hash);

        let record = match self
            .client
            .update::<PendingReport, _>(&path, "record abuse report", |mut pending| {
                pending
                    .record(action.key().to_string(), now)
                    .map_err(|e| StoreError::Default(e.into()))?;
                Ok(pending)
            })
            .await
        {
            Ok((record, _)) => record,
            Err(StoreError::NotFound) => {
                let mut pending = PendingReport::new(ip_hash.to_string())
                    .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;
                pending
                    .record(action.key().to_string(), now)
                    .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;
                match self.client.create(&path, &pending, "first abuse report").await {
                    Ok(_) => pending,
                    // lost the create race; re-apply as an update
                    Err(StoreError::Conflict) => {
                        self.client
                            .update::<PendingReport, _>(&path, "record abuse report", |mut p| {
                                p.record(action.key().to_string(), now)
                                    .map_err(|e| StoreError::Default(e.into()))?;
                                Ok(p)
                            })
                            .await?
                            .0
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        if !record.promotable(now) {
            return Ok(false);
        }

        let entry = BlacklistEntry::new(ip_hash.to_string(), record.recent(now), now)
            .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;
        match self
            .client
            .create(&paths::blacklist_entry(ip_hash), &entry, "promote to blacklist")
            .await
        {
            Ok(_) => {
                tracing::warn!(ip_hash, "ip hash promoted to blacklist");
                Ok(true)
            }
            // already promoted by a concurrent writer
            Err(StoreError::Conflict) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration as StdDuration;
    use store::backend::MemoryBackend;

    fn setup() -> (ManualClock, AbuseTracker) {
        let backend = MemoryBackend::new();
        let client = RepoClient::with_limits(
            Arc::new(backend),
            3,
            StdDuration::from_millis(200),
        );
        let clock = ManualClock::default();
        (clock.clone(), AbuseTracker::new(client, Arc::new(clock)))
    }

    #[tokio::test]
    async fn test_three_reports_promote() {
        let (_clock, abuse) = setup();
        assert!(!abuse.flag("hash", Action::FolderCreate).await.unwrap());
        assert!(!abuse.flag("hash", Action::FolderCreate).await.unwrap());
        assert!(abuse.flag("hash", Action::FolderCreate).await.unwrap());
        assert!(abuse.is_blacklisted("hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_reports_do_not_promote() {
        let (clock, abuse) = setup();
        abuse.flag("hash", Action::Rate).await.unwrap();
        abuse.flag("hash", Action::Rate).await.unwrap();
        clock.advance(chrono::Duration::days(8));
        assert!(!abuse.flag("hash", Action::Rate).await.unwrap());
        assert!(!abuse.is_blacklisted("hash").await.unwrap());
    }
}
