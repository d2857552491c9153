//! Folder & entity lifecycle
//!
//! Orchestrates the security manager and repository client into the domain
//! operations. The moderation state machine lives here:
//!
//! ```text
//! silent --(age >= 24h or interactions >= 5)--> active
//! silent --(blacklist promotion)-------------> flagged
//! ```
//!
//! `active` and `flagged` are terminal. Interaction count is email count
//! plus total likes plus total version count.
//!
//! Create operations return plaintext passwords exactly once; only hashes
//! are ever persisted. The only recovery path is the caller-side credential
//! cache, which is a deliberate trade-off of the display-once design.

mod email;
mod folder;
mod share;
#[cfg(test)]
pub(crate) mod test_support;
mod version;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::models::{Email, Folder, FolderStatus};
use store::{paths, Document, RepoClient};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::security::SecurityManager;

pub use email::{AttachmentUpload, CreatedEmail, NewEmail};
pub use folder::{CreatedFolder, NewFolder};
pub use share::SharedFolder;
pub use version::{RatingKind, VersionList};

/// Hours a silent folder waits before time-based approval
const APPROVAL_AGE_HOURS: i64 = 24;
/// Interaction count that approves a silent folder early
const APPROVAL_INTERACTIONS: u64 = 5;

/// A folder located in the store, with everything needed to mutate it
#[derive(Debug, Clone)]
pub(crate) struct LoadedFolder {
    pub folder: Folder,
    pub path: String,
    pub version: store::VersionToken,
}

/// The lifecycle manager; cheap to clone, explicitly constructed and passed
/// to callers (no process-wide singleton)
#[derive(Debug, Clone)]
pub struct Lifecycle {
    client: RepoClient,
    security: SecurityManager,
    clock: Arc<dyn Clock>,
}

impl Lifecycle {
    pub fn new(client: RepoClient, security: SecurityManager, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            security,
            clock,
        }
    }

    pub(crate) fn client(&self) -> &RepoClient {
        &self.client
    }

    pub(crate) fn security(&self) -> &SecurityManager {
        &self.security
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Locate a folder in any status location, verifying its checksum
    pub(crate) async fn load_folder(&self, id: Uuid) -> Result<LoadedFolder, ServiceError> {
        for status in [
            FolderStatus::Active,
            FolderStatus::Silent,
            FolderStatus::Flagged,
        ] {
            let path = paths::folder(status, id);
            let Some(doc) = self.client.get::<Folder>(&path).await? else {
                continue;
            };
            if !doc.body.integrity_ok() {
                return Err(ServiceError::IntegrityFailure(path));
            }
            return Ok(LoadedFolder {
                folder: doc.body,
                path,
                version: doc.version,
            });
        }
        Err(ServiceError::NotFound(format!("folder {}", id)))
    }

    /// Load an email, verifying its checksum
    pub(crate) async fn load_email(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
    ) -> Result<Document<Email>, ServiceError> {
        let path = paths::email(folder_id, email_id);
        let doc: Document<Email> = self
            .client
            .get(&path)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("email {}", email_id)))?;
        if !doc.body.integrity_ok() {
            return Err(ServiceError::IntegrityFailure(path));
        }
        Ok(doc)
    }
}
