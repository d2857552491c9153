//! Email operations

use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::models::{
    Attachment, Email, MAX_ATTACHMENT_SIZE_FORM, MAX_ATTACHMENT_SIZE_STORED,
};
use common::crypto::{PasswordClass, PasswordHash};
use store::{paths, StoreError};

use super::Lifecycle;
use crate::error::ServiceError;
use crate::security::Action;

/// Caller input for one attachment
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Caller input for email creation
#[derive(Debug, Clone)]
pub struct NewEmail {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<AttachmentUpload>,
}

/// Result of email creation; the content password is returned exactly once
#[derive(Debug)]
pub struct CreatedEmail {
    pub email: Email,
    pub content_password: String,
}

/// Stored shape of an attachment payload document
#[derive(Debug, Serialize, Deserialize)]
struct AttachmentPayload {
    data: String,
}

impl Lifecycle {
    /// Add a draft to a folder
    pub async fn add_email(
        &self,
        folder_id: Uuid,
        new: NewEmail,
        ip: &str,
    ) -> Result<CreatedEmail, ServiceError> {
        if new.subject.trim().is_empty() {
            return Err(ServiceError::Validation("subject is required".to_string()));
        }
        for upload in &new.attachments {
            validate_attachment(upload)?;
        }

        self.security().authorize(ip, Action::EmailCreate).await?;

        let loaded = self.load_folder(folder_id).await?;

        let content_password = PasswordClass::Content
            .generate()
            .map_err(|e| anyhow::anyhow!("password generation failed: {}", e))?;
        let password = PasswordHash::new(&content_password)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;

        let now = self.now();
        let email_id = Uuid::new_v4();
        let mut attachments = Vec::with_capacity(new.attachments.len());
        for upload in &new.attachments {
            let path = paths::attachment(folder_id, email_id, &upload.name);
            let payload = AttachmentPayload {
                data: base64::engine::general_purpose::STANDARD.encode(&upload.data),
            };
            self.client().create(&path, &payload, "store attachment").await?;
            attachments.push(
                Attachment::new(
                    upload.name.clone(),
                    upload.mime_type.clone(),
                    upload.data.len() as u64,
                    path,
                )
                .map_err(|e| anyhow::anyhow!("seal error: {}", e))?,
            );
        }

        let mut email = Email::new(
            folder_id,
            new.subject,
            new.body,
            attachments,
            &password,
            now,
        )
        .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;
        email.id = email_id;
        email.seal().map_err(|e| anyhow::anyhow!("seal error: {}", e))?;

        self.client()
            .create(&paths::email(folder_id, email_id), &email, "create email")
            .await?;

        // register the email on the folder; merge-aware so concurrent adds
        // do not drop each other's ids
        self.client()
            .update::<common::models::Folder, _>(&loaded.path, "register email", |mut folder| {
                if !folder.emails.contains(&email_id) {
                    folder.emails.push(email_id);
                }
                folder
                    .touch(now)
                    .map_err(|e| StoreError::Default(e.into()))?;
                Ok(folder)
            })
            .await?;

        tracing::info!(folder = %folder_id, email = %email_id, "email created");
        Ok(CreatedEmail {
            email,
            content_password,
        })
    }

    /// Delete a draft, authorized by its own content password
    pub async fn delete_email(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
        password: &str,
    ) -> Result<(), ServiceError> {
        let doc = self.load_email(folder_id, email_id).await?;
        if !doc.body.content_hash().verify(password) {
            return Err(ServiceError::Unauthorized);
        }

        let loaded = self.load_folder(folder_id).await?;
        self.delete_email_content(folder_id, email_id).await?;

        let now = self.now();
        self.client()
            .update::<common::models::Folder, _>(&loaded.path, "deregister email", |mut folder| {
                folder.emails.retain(|id| *id != email_id);
                folder
                    .touch(now)
                    .map_err(|e| StoreError::Default(e.into()))?;
                Ok(folder)
            })
            .await?;

        tracing::info!(folder = %folder_id, email = %email_id, "email deleted");
        Ok(())
    }

    /// Public like counter; +1 or -1, clamped at zero, no authorization
    pub async fn like_email(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
        delta: i64,
        ip: &str,
    ) -> Result<Email, ServiceError> {
        if delta != 1 && delta != -1 {
            return Err(ServiceError::Validation("delta must be +1 or -1".to_string()));
        }
        self.security().authorize(ip, Action::Rate).await?;

        let now = self.now();
        let (email, _) = self
            .client()
            .update::<Email, _>(&paths::email(folder_id, email_id), "like email", |mut email| {
                if !email.integrity_ok() {
                    return Err(StoreError::Default(anyhow::anyhow!("checksum mismatch")));
                }
                email.apply_like(delta);
                email
                    .touch(now)
                    .map_err(|e| StoreError::Default(e.into()))?;
                Ok(email)
            })
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::NotFound(format!("email {}", email_id)),
                other => other.into(),
            })?;
        Ok(email)
    }

    /// Fetch an attachment payload, rate-limited per downloader
    pub async fn get_attachment(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
        name: &str,
        ip: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        self.security()
            .authorize(ip, Action::AttachmentDownload)
            .await?;

        let path = paths::attachment(folder_id, email_id, name);
        let doc = self
            .client()
            .get::<AttachmentPayload>(&path)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("attachment {}", name)))?;
        base64::engine::general_purpose::STANDARD
            .decode(&doc.body.data)
            .map_err(|_| ServiceError::IntegrityFailure(path))
    }

    /// Remove an email document, its attachments and its versions
    pub(crate) async fn delete_email_content(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
    ) -> Result<(), ServiceError> {
        for entry in self
            .client()
            .list(&paths::attachments_dir(folder_id, email_id))
            .await?
        {
            if entry.is_dir {
                continue;
            }
            let path = paths::attachment(folder_id, email_id, &entry.name);
            self.client().delete(&path, "delete attachment", None).await?;
        }

        let versions_dir = paths::email_versions_dir(&email_id.to_string());
        for entry in self.client().list(&versions_dir).await? {
            if entry.is_dir {
                continue;
            }
            let path = format!("{}/{}", versions_dir, entry.name);
            self.client().delete(&path, "delete version", None).await?;
        }

        self.client()
            .delete(&paths::email(folder_id, email_id), "delete email", None)
            .await?;
        Ok(())
    }
}

fn validate_attachment(upload: &AttachmentUpload) -> Result<(), ServiceError> {
    if !Attachment::mime_allowed(&upload.mime_type) {
        return Err(ServiceError::Validation(format!(
            "attachment type {} is not allowed",
            upload.mime_type
        )));
    }
    let size = upload.data.len() as u64;
    // both boundaries reject; the form cap is the tighter one
    if size > MAX_ATTACHMENT_SIZE_FORM || size > MAX_ATTACHMENT_SIZE_STORED {
        return Err(ServiceError::Validation(
            "attachment exceeds the 5 MB limit".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lifecycle::test_support::harness;

    #[tokio::test]
    async fn test_add_email_returns_content_password_once() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let created = h
            .lifecycle
            .add_email(
                folder.folder.id,
                NewEmail {
                    subject: "Hello".to_string(),
                    body: "World".to_string(),
                    attachments: vec![],
                },
                "1.2.3.4",
            )
            .await
            .unwrap();

        assert_eq!(created.content_password.len(), 16);
        // only the hash is persisted
        let stored = h
            .lifecycle
            .load_email(folder.folder.id, created.email.id)
            .await
            .unwrap();
        assert!(stored.body.content_hash().verify(&created.content_password));

        let loaded = h.lifecycle.load_folder(folder.folder.id).await.unwrap();
        assert!(loaded.folder.emails.contains(&created.email.id));
    }

    #[tokio::test]
    async fn test_oversized_attachment_rejected() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let result = h
            .lifecycle
            .add_email(
                folder.folder.id,
                NewEmail {
                    subject: "Hello".to_string(),
                    body: String::new(),
                    attachments: vec![AttachmentUpload {
                        name: "big.png".to_string(),
                        mime_type: "image/png".to_string(),
                        data: vec![0u8; 6_000_000],
                    }],
                },
                "1.2.3.4",
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disallowed_mime_rejected() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let result = h
            .lifecycle
            .add_email(
                folder.folder.id,
                NewEmail {
                    subject: "Hello".to_string(),
                    body: String::new(),
                    attachments: vec![AttachmentUpload {
                        name: "run.exe".to_string(),
                        mime_type: "application/x-msdownload".to_string(),
                        data: vec![0u8; 10],
                    }],
                },
                "1.2.3.4",
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_attachment_roundtrip() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let created = h
            .lifecycle
            .add_email(
                folder.folder.id,
                NewEmail {
                    subject: "Hello".to_string(),
                    body: String::new(),
                    attachments: vec![AttachmentUpload {
                        name: "pic.png".to_string(),
                        mime_type: "image/png".to_string(),
                        data: vec![1, 2, 3, 4],
                    }],
                },
                "1.2.3.4",
            )
            .await
            .unwrap();
        assert_eq!(created.email.attachments.len(), 1);

        let data = h
            .lifecycle
            .get_attachment(folder.folder.id, created.email.id, "pic.png", "5.6.7.8")
            .await
            .unwrap();
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_likes_clamp_and_count() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let created = h.add_email(folder.folder.id, "Subject").await;

        let email = h
            .lifecycle
            .like_email(folder.folder.id, created.email.id, -1, "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(email.likes, 0);

        h.lifecycle
            .like_email(folder.folder.id, created.email.id, 1, "1.2.3.4")
            .await
            .unwrap();
        let email = h
            .lifecycle
            .like_email(folder.folder.id, created.email.id, 1, "1.2.3.4")
            .await
            .unwrap();
        assert_eq!(email.likes, 2);
    }

    #[tokio::test]
    async fn test_delete_email_requires_its_own_password() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let created = h.add_email(folder.folder.id, "Subject").await;

        let result = h
            .lifecycle
            .delete_email(folder.folder.id, created.email.id, "wrong")
            .await;
        assert!(matches!(result, Err(ServiceError::Unauthorized)));

        h.lifecycle
            .delete_email(folder.folder.id, created.email.id, &created.content_password)
            .await
            .unwrap();
        let loaded = h.lifecycle.load_folder(folder.folder.id).await.unwrap();
        assert!(loaded.folder.emails.is_empty());
    }
}
