//! Share link resolution

use uuid::Uuid;

use common::crypto::ShareToken;
use common::models::{Folder, ShareLink, ShareMetadata};
use store::paths;

use super::Lifecycle;
use crate::error::ServiceError;

/// A folder resolved through a share link
#[derive(Debug)]
pub struct SharedFolder {
    pub folder: Folder,
    pub metadata: ShareMetadata,
}

impl Lifecycle {
    /// Resolve a share link to its folder
    ///
    /// Works for folders of any status: the token is a capability and
    /// moderation visibility rules apply to the public listing only.
    pub async fn resolve_share_link(&self, token: &ShareToken) -> Result<SharedFolder, ServiceError> {
        let path = paths::share_link(token.as_str());
        let Some(doc) = self.client().get::<ShareLink>(&path).await? else {
            return Err(ServiceError::NotFound(format!("share link {}", token)));
        };
        if !doc.body.integrity_ok() {
            return Err(ServiceError::IntegrityFailure(path));
        }
        let metadata = doc
            .body
            .open_metadata()
            .map_err(|_| ServiceError::IntegrityFailure(path))?;

        let loaded = self.load_folder(doc.body.folder_id).await?;
        Ok(SharedFolder {
            folder: loaded.folder,
            metadata,
        })
    }

    /// Store a fresh share link for a folder and hand back its token
    pub(crate) async fn create_share_link(&self, folder: &Folder) -> Result<ShareToken, ServiceError> {
        let token = ShareToken::generate()
            .map_err(|e| anyhow::anyhow!("token generation failed: {}", e))?;
        let metadata = ShareMetadata {
            name: folder.name.clone(),
            target_email: folder.target_email.clone(),
            created_at: folder.created_at,
        };
        let link = ShareLink::new(token.clone(), folder.id, &metadata, self.now())
            .map_err(|e| anyhow::anyhow!("share link sealing failed: {}", e))?;
        self.client()
            .create(&paths::share_link(token.as_str()), &link, "create share link")
            .await?;
        Ok(token)
    }

    /// Remove every link pointing at a folder
    ///
    /// Requires reading each link to learn its target; tolerates links that
    /// vanish mid-scan.
    pub(crate) async fn delete_share_links_for(&self, folder_id: Uuid) -> Result<(), ServiceError> {
        for entry in self.client().list(&paths::share_links_dir()).await? {
            if entry.is_dir || !entry.name.ends_with(".json") {
                continue;
            }
            let path = format!("{}/{}", paths::share_links_dir(), entry.name);
            let Some(doc) = self.client().get::<ShareLink>(&path).await? else {
                continue;
            };
            if doc.body.folder_id == folder_id {
                self.client()
                    .delete(&path, "delete share link", Some(doc.version))
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lifecycle::test_support::harness;

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let h = harness();
        let token = ShareToken::generate().unwrap();
        let result = h.lifecycle.resolve_share_link(&token).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_share_link_reveals_metadata_for_silent_folder() {
        let h = harness();
        let created = h.create_folder("Quiet").await;
        // the folder is silent and absent from the public listing, but the
        // link still resolves
        assert!(h.lifecycle.list_folders().await.unwrap().is_empty());

        let shared = h
            .lifecycle
            .resolve_share_link(&created.share_token)
            .await
            .unwrap();
        assert_eq!(shared.metadata.name, "Quiet");
        assert_eq!(shared.metadata.target_email, "a@b.com");
    }

    #[tokio::test]
    async fn test_links_removed_with_folder() {
        let h = harness();
        let created = h.create_folder("Test").await;
        h.lifecycle
            .delete_folder(created.folder.id, &created.admin_password)
            .await
            .unwrap();

        let result = h.lifecycle.resolve_share_link(&created.share_token).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
