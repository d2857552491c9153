//! Email drafts and their attachments
//!
//! Emails are owned exclusively by their folder and are deleted with it.
//! Each email carries its own content password so the author can delete it
//! without the folder admin credential. Likes are a public counter clamped
//! at zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{checksum_of, ChecksumError, PasswordHash};

/// Per-attachment cap enforced at the form boundary (5 MB)
pub const MAX_ATTACHMENT_SIZE_FORM: u64 = 5 * 1024 * 1024;
/// Per-attachment cap enforced at the storage boundary (10 MB)
pub const MAX_ATTACHMENT_SIZE_STORED: u64 = 10 * 1024 * 1024;

/// MIME types an attachment may carry
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
];

/// Attachment metadata stored inside the email document
///
/// The payload itself is stored independently; `content` is the repository
/// path it was written to, addressed by folder and email id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Repository path of the stored payload
    pub content: String,
    pub checksum: String,
}

impl Attachment {
    pub fn new(
        name: String,
        mime_type: String,
        size: u64,
        content: String,
    ) -> Result<Self, ChecksumError> {
        let mut attachment = Self {
            name,
            mime_type,
            size,
            content,
            checksum: String::new(),
        };
        attachment.checksum = checksum_of(&attachment)?;
        Ok(attachment)
    }

    pub fn mime_allowed(mime_type: &str) -> bool {
        ALLOWED_MIME_TYPES.contains(&mime_type)
    }
}

/// An email draft inside a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
    pub password_hash: String,
    pub password_salt: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub checksum: String,
}

impl Email {
    /// Create a new draft and seal its checksum
    pub fn new(
        folder_id: Uuid,
        subject: String,
        body: String,
        attachments: Vec<Attachment>,
        password: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<Self, ChecksumError> {
        let mut email = Self {
            id: Uuid::new_v4(),
            folder_id,
            subject,
            body,
            attachments,
            password_hash: password.hash.clone(),
            password_salt: password.salt.clone(),
            likes: 0,
            created_at: now,
            updated_at: now,
            checksum: String::new(),
        };
        email.seal()?;
        Ok(email)
    }

    /// The stored content credential
    pub fn content_hash(&self) -> PasswordHash {
        PasswordHash::from_parts(&self.password_hash, &self.password_salt)
    }

    /// Apply a like delta, clamping the counter at zero
    pub fn apply_like(&mut self, delta: i64) {
        self.likes = self.likes.saturating_add_signed(delta);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) -> Result<(), ChecksumError> {
        self.updated_at = now;
        self.seal()
    }

    pub fn seal(&mut self) -> Result<(), ChecksumError> {
        self.checksum = String::new();
        self.checksum = checksum_of(self)?;
        Ok(())
    }

    pub fn integrity_ok(&self) -> bool {
        checksum_of(self).map(|c| c == self.checksum).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn email() -> Email {
        let password = PasswordHash::new("content-password").unwrap();
        Email::new(
            Uuid::new_v4(),
            "Subject".to_string(),
            "Body".to_string(),
            Vec::new(),
            &password,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_email_sealed() {
        let email = email();
        assert_eq!(email.likes, 0);
        assert!(email.integrity_ok());
    }

    #[test]
    fn test_likes_clamped_at_zero() {
        let mut email = email();
        email.apply_like(-1);
        assert_eq!(email.likes, 0);
        email.apply_like(1);
        email.apply_like(1);
        email.apply_like(-1);
        assert_eq!(email.likes, 1);
    }

    #[test]
    fn test_mime_allow_list() {
        assert!(Attachment::mime_allowed("image/png"));
        assert!(Attachment::mime_allowed("application/pdf"));
        assert!(!Attachment::mime_allowed("application/x-msdownload"));
        assert!(!Attachment::mime_allowed("text/html"));
    }

    #[test]
    fn test_attachment_checksum_covers_fields() {
        let a = Attachment::new(
            "a.png".to_string(),
            "image/png".to_string(),
            1024,
            "attachments/f/e/a.png".to_string(),
        )
        .unwrap();
        let b = Attachment::new(
            "a.png".to_string(),
            "image/png".to_string(),
            1025,
            "attachments/f/e/a.png".to_string(),
        )
        .unwrap();
        assert_ne!(a.checksum, b.checksum);
    }
}
