//! Device-bound credential cache
//!
//! Passwords the user chose to retain so their own content never re-prompts.
//! The cache is local only: records never leave the device, plaintext copies
//! are encrypted under the device id, and the whole blob carries an
//! integrity digest that is verified before anything is trusted. A digest
//! mismatch means "no usable cache", never a partial read.
//!
//! Saving requires one-time consent; without it `save` is a recorded no-op.
//! The kill switch deletes every remote entity the cache still holds a
//! password for (best effort) and then wipes the cache.

mod local_store;

use std::sync::Arc;

use common::crypto::checksum_of;
use common::models::{CredentialKind, CredentialRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use local_store::{FileStore, LocalStore, MemoryStore};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::lifecycle::Lifecycle;

const CACHE_KEY: &str = "draftbox.credentials";
const CONSENT_KEY: &str = "draftbox.consent";
const DEVICE_KEY: &str = "draftbox.device";

/// The persisted cache blob: records plus a digest over them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheBlob {
    records: Vec<CredentialRecord>,
    checksum: String,
}

/// Outcome of a kill-switch run
#[derive(Debug, Default)]
pub struct KillSwitchReport {
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct CredentialCache {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    device_id: String,
}

impl CredentialCache {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        let device_id = match store.get(DEVICE_KEY) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                store.set(DEVICE_KEY, &id);
                id
            }
        };
        Self {
            store,
            clock,
            device_id,
        }
    }

    /// Whether the user has answered the save-passwords prompt, and how
    pub fn consent(&self) -> Option<bool> {
        match self.store.get(CONSENT_KEY).as_deref() {
            Some("granted") => Some(true),
            Some("denied") => Some(false),
            _ => None,
        }
    }

    /// Record the one-time consent decision
    pub fn set_consent(&self, granted: bool) {
        self.store
            .set(CONSENT_KEY, if granted { "granted" } else { "denied" });
    }

    /// Store a password; returns whether it was actually saved
    ///
    /// A no-op (returning `false`) when consent was denied or not yet
    /// given; the caller is responsible for prompting first.
    pub fn save(
        &self,
        kind: CredentialKind,
        entity_id: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        if self.consent() != Some(true) {
            return Ok(false);
        }

        let record = CredentialRecord::new(
            kind,
            entity_id.to_string(),
            password,
            self.device_id.clone(),
            self.clock.now(),
        )
        .map_err(|e| anyhow::anyhow!("encrypt error: {}", e))?;

        let mut records = self.load();
        records.retain(|r| r.key() != record.key());
        records.push(record);
        self.persist(records)?;
        Ok(true)
    }

    /// Recover a plaintext password, touching `lastUsed`
    pub fn get(&self, kind: CredentialKind, entity_id: &str) -> Option<String> {
        let key = CredentialRecord::key_for(kind, entity_id);
        let mut records = self.load();
        let mut found = None;
        for record in records.iter_mut() {
            if record.key() == key {
                found = record.open(&self.device_id);
                if found.is_some() {
                    record.last_used = self.clock.now();
                }
            }
        }
        if found.is_some() {
            // best effort; a failed touch loses a timestamp, not data
            if let Err(e) = self.persist(records) {
                tracing::warn!("failed to touch credential record: {}", e);
            }
        }
        found
    }

    /// Hash-only verification without decrypting the stored plaintext
    pub fn verify(&self, kind: CredentialKind, entity_id: &str, password: &str) -> bool {
        let key = CredentialRecord::key_for(kind, entity_id);
        self.load()
            .iter()
            .any(|r| r.key() == key && r.verify(password))
    }

    pub fn remove(&self, kind: CredentialKind, entity_id: &str) -> Result<(), ServiceError> {
        let key = CredentialRecord::key_for(kind, entity_id);
        let mut records = self.load();
        records.retain(|r| r.key() != key);
        self.persist(records)
    }

    /// Every cached record, foreign-device entries already purged
    pub fn records(&self) -> Vec<CredentialRecord> {
        self.load()
    }

    /// Delete the remote entities the cache holds passwords for, then wipe
    /// the matching records
    ///
    /// `kind` limits the run to folder or email records; `None` covers
    /// everything. Per-entity failures are logged and skipped; the wipe
    /// happens regardless so a partially failing run cannot leave
    /// recovered passwords behind.
    pub async fn kill_switch(
        &self,
        lifecycle: &Lifecycle,
        kind: Option<CredentialKind>,
    ) -> KillSwitchReport {
        let mut report = KillSwitchReport::default();
        let mut kept = Vec::new();
        for record in self.load() {
            if kind.is_some_and(|k| k != record.kind) {
                kept.push(record);
                continue;
            }
            let Some(password) = record.open(&self.device_id) else {
                continue;
            };
            let result = match record.kind {
                CredentialKind::Folder => match record.entity_id.parse() {
                    Ok(id) => lifecycle.delete_folder(id, &password).await,
                    Err(e) => Err(ServiceError::Validation(format!("bad folder id: {}", e))),
                },
                CredentialKind::Email => {
                    match parse_email_key(&record.entity_id) {
                        Some((folder_id, email_id)) => {
                            lifecycle.delete_email(folder_id, email_id, &password).await
                        }
                        None => Err(ServiceError::Validation("bad email key".to_string())),
                    }
                }
            };
            match result {
                Ok(()) | Err(ServiceError::NotFound(_)) => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(key = record.key(), "kill switch delete failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        if kept.is_empty() {
            self.store.remove(CACHE_KEY);
        } else if let Err(e) = self.persist(kept) {
            tracing::warn!("failed to rewrite cache after scoped kill switch: {}", e);
            self.store.remove(CACHE_KEY);
        }
        report
    }

    /// Email records are keyed `folderId/emailId`
    pub fn email_key(folder_id: Uuid, email_id: Uuid) -> String {
        format!("{}/{}", folder_id, email_id)
    }

    fn load(&self) -> Vec<CredentialRecord> {
        let Some(raw) = self.store.get(CACHE_KEY) else {
            return Vec::new();
        };
        let blob: CacheBlob = match serde_json::from_str(&raw) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("credential cache unreadable, treating as empty: {}", e);
                return Vec::new();
            }
        };
        match checksum_of(&blob) {
            Ok(digest) if digest == blob.checksum => {}
            _ => {
                // fail closed: unverifiable local data is no data
                tracing::warn!("credential cache integrity check failed");
                return Vec::new();
            }
        }
        let (ours, foreign): (Vec<_>, Vec<_>) = blob
            .records
            .into_iter()
            .partition(|r| r.device_id == self.device_id);
        if !foreign.is_empty() {
            tracing::info!(count = foreign.len(), "purging foreign-device records");
            if let Err(e) = self.persist(ours.clone()) {
                tracing::warn!("failed to purge foreign records: {}", e);
            }
        }
        ours
    }

    fn persist(&self, records: Vec<CredentialRecord>) -> Result<(), ServiceError> {
        let mut blob = CacheBlob {
            records,
            checksum: String::new(),
        };
        blob.checksum = checksum_of(&blob).map_err(|e| anyhow::anyhow!("digest error: {}", e))?;
        let raw =
            serde_json::to_string(&blob).map_err(|e| anyhow::anyhow!("encode error: {}", e))?;
        self.store.set(CACHE_KEY, &raw);
        Ok(())
    }
}

fn parse_email_key(key: &str) -> Option<(Uuid, Uuid)> {
    let (folder, email) = key.split_once('/')?;
    Some((folder.parse().ok()?, email.parse().ok()?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::ManualClock;

    fn cache() -> (Arc<MemoryStore>, CredentialCache) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = CredentialCache::new(store.clone(), clock);
        cache.set_consent(true);
        (store, cache)
    }

    #[test]
    fn test_save_get_verify_roundtrip() {
        let (_store, cache) = cache();
        assert!(cache
            .save(CredentialKind::Folder, "folder-1", "the-password")
            .unwrap());
        assert_eq!(
            cache.get(CredentialKind::Folder, "folder-1").as_deref(),
            Some("the-password")
        );
        assert!(cache.verify(CredentialKind::Folder, "folder-1", "the-password"));
        assert!(!cache.verify(CredentialKind::Folder, "folder-1", "wrong"));
    }

    #[test]
    fn test_no_consent_no_save() {
        let store = Arc::new(MemoryStore::new());
        let cache = CredentialCache::new(store, Arc::new(ManualClock::default()));
        assert!(!cache
            .save(CredentialKind::Folder, "folder-1", "password")
            .unwrap());
        assert_eq!(cache.get(CredentialKind::Folder, "folder-1"), None);
    }

    #[test]
    fn test_tampered_blob_fails_closed() {
        let (store, cache) = cache();
        cache
            .save(CredentialKind::Folder, "folder-1", "password")
            .unwrap();

        let raw = store.get(CACHE_KEY).unwrap();
        store.set(CACHE_KEY, &raw.replace("folder-1", "folder-2"));
        assert_eq!(cache.get(CredentialKind::Folder, "folder-2"), None);
        assert_eq!(cache.get(CredentialKind::Folder, "folder-1"), None);
    }

    #[test]
    fn test_foreign_device_records_purged_on_read() {
        let (store, cache) = cache();
        cache
            .save(CredentialKind::Folder, "folder-1", "password")
            .unwrap();

        // A second cache over the same store but a different device id
        store.remove(DEVICE_KEY);
        let other = CredentialCache::new(store.clone(), Arc::new(ManualClock::default()));
        assert_eq!(other.get(CredentialKind::Folder, "folder-1"), None);
        assert!(other.records().is_empty());
    }

    #[test]
    fn test_remove() {
        let (_store, cache) = cache();
        cache
            .save(CredentialKind::Email, "f/e", "password")
            .unwrap();
        cache.remove(CredentialKind::Email, "f/e").unwrap();
        assert_eq!(cache.get(CredentialKind::Email, "f/e"), None);
    }

    #[tokio::test]
    async fn test_kill_switch_scoped_to_kind_keeps_other_records() {
        let h = crate::lifecycle::test_support::harness();
        let created = h.create_folder("Doomed").await;
        let folder_id = created.folder.id;
        let email = h.add_email(folder_id, "Draft").await;

        let (_store, cache) = cache();
        let email_key = CredentialCache::email_key(folder_id, email.email.id);
        cache
            .save(
                CredentialKind::Folder,
                &folder_id.to_string(),
                &created.admin_password,
            )
            .unwrap();
        cache
            .save(CredentialKind::Email, &email_key, &email.content_password)
            .unwrap();

        let report = cache
            .kill_switch(&h.lifecycle, Some(CredentialKind::Email))
            .await;
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(cache.get(CredentialKind::Email, &email_key), None);
        assert_eq!(
            cache
                .get(CredentialKind::Folder, &folder_id.to_string())
                .as_deref(),
            Some(created.admin_password.as_str())
        );

        // The email is gone remotely; a second scoped pass finds nothing
        let again = cache
            .kill_switch(&h.lifecycle, Some(CredentialKind::Email))
            .await;
        assert_eq!(again.deleted, 0);
    }

    #[tokio::test]
    async fn test_kill_switch_all_deletes_everything_and_wipes() {
        let h = crate::lifecycle::test_support::harness();
        let created = h.create_folder("Doomed").await;
        let folder_id = created.folder.id;

        let (store, cache) = cache();
        cache
            .save(
                CredentialKind::Folder,
                &folder_id.to_string(),
                &created.admin_password,
            )
            .unwrap();

        let report = cache.kill_switch(&h.lifecycle, None).await;
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 0);
        assert!(cache.records().is_empty());
        assert_eq!(store.get(CACHE_KEY), None);
        assert!(matches!(
            h.lifecycle.check_approval(folder_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
