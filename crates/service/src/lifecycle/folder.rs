//! Folder operations and the moderation state machine

use chrono::Duration;
use uuid::Uuid;

use common::crypto::{hash_ip, PasswordClass, PasswordHash, ShareToken};
use common::models::{Folder, FolderStatus};
use store::{paths, StoreError};

use super::{Lifecycle, APPROVAL_AGE_HOURS, APPROVAL_INTERACTIONS};
use crate::error::ServiceError;
use crate::security::Action;

/// Caller input for folder creation
#[derive(Debug, Clone)]
pub struct NewFolder {
    pub name: String,
    pub target_email: String,
}

/// Result of folder creation
///
/// `admin_password` is returned exactly once and never persisted in
/// plaintext server-side; losing it means losing admin access unless the
/// caller cached it.
#[derive(Debug)]
pub struct CreatedFolder {
    pub folder: Folder,
    pub admin_password: String,
    pub share_token: ShareToken,
}

impl Lifecycle {
    /// Create a silent folder plus its first share link
    pub async fn create_folder(
        &self,
        new: NewFolder,
        ip: &str,
    ) -> Result<CreatedFolder, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("folder name is required".to_string()));
        }
        if !new.target_email.contains('@') {
            return Err(ServiceError::Validation(
                "target email must be a valid address".to_string(),
            ));
        }

        self.security().authorize(ip, Action::FolderCreate).await?;

        let admin_password = PasswordClass::Admin
            .generate()
            .map_err(|e| anyhow::anyhow!("password generation failed: {}", e))?;
        let admin = PasswordHash::new(&admin_password)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;

        let now = self.now();
        let folder = Folder::new(new.name, new.target_email, hash_ip(ip), &admin, now)
            .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;

        self.client()
            .create(
                &paths::folder(FolderStatus::Silent, folder.id),
                &folder,
                "create folder",
            )
            .await?;

        let share_token = self.create_share_link(&folder).await?;

        tracing::info!(folder = %folder.id, "folder created (silent)");
        Ok(CreatedFolder {
            folder,
            admin_password,
            share_token,
        })
    }

    /// Delete a folder and everything it owns
    ///
    /// Children are removed first, tolerating already-missing paths, so a
    /// partially deleted folder can be deleted again. Share-link cleanup is
    /// best effort: a dangling link decrypts to metadata for a folder that
    /// no longer resolves, which is harmless.
    pub async fn delete_folder(&self, id: Uuid, password: &str) -> Result<(), ServiceError> {
        let loaded = self.load_folder(id).await?;
        if !loaded.folder.admin_hash().verify(password) {
            return Err(ServiceError::Unauthorized);
        }

        for email_id in &loaded.folder.emails {
            self.delete_email_content(id, *email_id).await?;
        }

        self.client()
            .delete(&loaded.path, "delete folder", Some(loaded.version))
            .await?;

        if let Err(e) = self.delete_share_links_for(id).await {
            tracing::warn!(folder = %id, "share link cleanup failed: {}", e);
        }

        tracing::info!(folder = %id, "folder deleted");
        Ok(())
    }

    /// Active folders, newest first
    pub async fn list_folders(&self) -> Result<Vec<Folder>, ServiceError> {
        let dir = format!("folders/{}", FolderStatus::Active.segment());
        let mut folders = Vec::new();
        for entry in self.client().list(&dir).await? {
            if entry.is_dir || !entry.name.ends_with(".json") {
                continue;
            }
            let path = format!("{}/{}", dir, entry.name);
            let Some(doc) = self.client().get::<Folder>(&path).await? else {
                // listed a moment ago, deleted since; propagation delay
                continue;
            };
            if !doc.body.integrity_ok() {
                return Err(ServiceError::IntegrityFailure(path));
            }
            folders.push(doc.body);
        }
        folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(folders)
    }

    /// Promote a silent folder to active if it qualifies
    ///
    /// Returns the folder's status after the check. The active copy is
    /// written before the silent one is removed, so a crash between the two
    /// leaves a duplicate that the silent-side delete tolerates on retry.
    pub async fn check_approval(&self, id: Uuid) -> Result<FolderStatus, ServiceError> {
        let loaded = self.load_folder(id).await?;
        if loaded.folder.status != FolderStatus::Silent {
            return Ok(loaded.folder.status);
        }

        let now = self.now();
        let old_enough = now - loaded.folder.created_at >= Duration::hours(APPROVAL_AGE_HOURS);
        let interactions = self.interaction_count(&loaded.folder).await?;
        if !old_enough && interactions < APPROVAL_INTERACTIONS {
            return Ok(FolderStatus::Silent);
        }

        self.transition(loaded, FolderStatus::Active).await?;
        tracing::info!(folder = %id, interactions, "folder approved");
        Ok(FolderStatus::Active)
    }

    /// File an abuse report against the folder's creator; flags the folder
    /// when the report promotes the creator onto the blacklist
    pub async fn report_folder(&self, id: Uuid) -> Result<FolderStatus, ServiceError> {
        let loaded = self.load_folder(id).await?;
        let creator = loaded.folder.creator_ip.clone();
        let promoted = self.security().abuse().flag(&creator, Action::FolderCreate).await?;

        if promoted && loaded.folder.status == FolderStatus::Silent {
            self.transition(loaded, FolderStatus::Flagged).await?;
            tracing::warn!(folder = %id, "folder flagged");
            return Ok(FolderStatus::Flagged);
        }
        Ok(loaded.folder.status)
    }

    /// Emails + total likes + total versions
    pub(crate) async fn interaction_count(&self, folder: &Folder) -> Result<u64, ServiceError> {
        let mut count = folder.emails.len() as u64;
        for email_id in &folder.emails {
            let doc = self.load_email(folder.id, *email_id).await?;
            count += doc.body.likes;
            let versions = self
                .client()
                .list(&paths::email_versions_dir(&email_id.to_string()))
                .await?;
            count += versions
                .iter()
                .filter(|e| !e.is_dir && e.name.ends_with(".json"))
                .count() as u64;
        }
        Ok(count)
    }

    /// Move a folder document to the location of its next status
    async fn transition(
        &self,
        loaded: super::LoadedFolder,
        next: FolderStatus,
    ) -> Result<(), ServiceError> {
        if !loaded.folder.status.can_transition(next) {
            return Err(ServiceError::Validation(format!(
                "folder cannot move from {} to {}",
                loaded.folder.status, next
            )));
        }

        let mut folder = loaded.folder;
        folder.status = next;
        folder
            .touch(self.now())
            .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;

        let target = paths::folder(next, folder.id);
        match self.client().create(&target, &folder, "folder transition").await {
            Ok(_) => {}
            // a concurrent approval already wrote the copy
            Err(StoreError::Conflict) => {}
            Err(e) => return Err(e.into()),
        }
        self.client()
            .delete(&loaded.path, "remove previous status copy", Some(loaded.version))
            .await?;
        Ok(())
    }
}
