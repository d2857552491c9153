//! # Folder
//!
//! The folder is the root entity of the data model. It owns a set of email
//! drafts, carries the admin credential that authorizes destructive
//! operations, and moves through a small moderation state machine:
//!
//! - **silent**: newly created, unlisted, pending approval
//! - **active**: approved (age or interaction threshold reached), listed
//! - **flagged**: removed from circulation by the abuse mechanism
//!
//! Transitions only leave `silent`; `active` and `flagged` are terminal.
//! The folder document lives under the path segment matching its status,
//! so approval moves the document from `folders/silent/` to
//! `folders/active/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{checksum_of, ChecksumError, PasswordHash};

/// Moderation state of a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderStatus {
    Silent,
    Active,
    Flagged,
}

impl FolderStatus {
    /// Path segment the folder document is stored under
    pub fn segment(&self) -> &'static str {
        match self {
            FolderStatus::Silent => "silent",
            FolderStatus::Active => "active",
            FolderStatus::Flagged => "flagged",
        }
    }

    /// Whether the state machine permits moving to `next`
    ///
    /// Only silent folders transition; active and flagged are terminal.
    pub fn can_transition(&self, next: FolderStatus) -> bool {
        matches!(
            (self, next),
            (FolderStatus::Silent, FolderStatus::Active)
                | (FolderStatus::Silent, FolderStatus::Flagged)
        )
    }
}

impl std::fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

/// A moderated folder of email drafts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub target_email: String,
    pub status: FolderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// One-way hash of the creator's IP; the raw address is never at rest
    pub creator_ip: String,
    pub admin_password_hash: String,
    pub admin_password_salt: String,
    /// Denormalized list of owned email ids, kept in insertion order
    pub emails: Vec<Uuid>,
    pub checksum: String,
}

impl Folder {
    /// Create a new silent folder and seal its checksum
    pub fn new(
        name: String,
        target_email: String,
        creator_ip_hash: String,
        admin: &PasswordHash,
        now: DateTime<Utc>,
    ) -> Result<Self, ChecksumError> {
        let mut folder = Self {
            id: Uuid::new_v4(),
            name,
            target_email,
            status: FolderStatus::Silent,
            created_at: now,
            updated_at: now,
            creator_ip: creator_ip_hash,
            admin_password_hash: admin.hash.clone(),
            admin_password_salt: admin.salt.clone(),
            emails: Vec::new(),
            checksum: String::new(),
        };
        folder.seal()?;
        Ok(folder)
    }

    /// The stored admin credential
    pub fn admin_hash(&self) -> PasswordHash {
        PasswordHash::from_parts(&self.admin_password_hash, &self.admin_password_salt)
    }

    /// Recompute the checksum after a field mutation, bumping `updatedAt`
    pub fn touch(&mut self, now: DateTime<Utc>) -> Result<(), ChecksumError> {
        self.updated_at = now;
        self.seal()
    }

    /// Recompute and store the checksum without touching timestamps
    pub fn seal(&mut self) -> Result<(), ChecksumError> {
        self.checksum = String::new();
        self.checksum = checksum_of(self)?;
        Ok(())
    }

    /// Whether the stored checksum matches the current fields
    pub fn integrity_ok(&self) -> bool {
        checksum_of(self).map(|c| c == self.checksum).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn folder() -> Folder {
        let admin = PasswordHash::new("password").unwrap();
        Folder::new(
            "Test".to_string(),
            "a@b.com".to_string(),
            "aabbcc".to_string(),
            &admin,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_folder_is_silent_and_sealed() {
        let folder = folder();
        assert_eq!(folder.status, FolderStatus::Silent);
        assert!(folder.integrity_ok());
        assert!(!folder.checksum.is_empty());
    }

    #[test]
    fn test_mutation_breaks_integrity_until_resealed() {
        let mut folder = folder();
        folder.emails.push(Uuid::new_v4());
        assert!(!folder.integrity_ok());
        folder.seal().unwrap();
        assert!(folder.integrity_ok());
    }

    #[test]
    fn test_status_transitions() {
        use FolderStatus::*;
        assert!(Silent.can_transition(Active));
        assert!(Silent.can_transition(Flagged));
        assert!(!Active.can_transition(Flagged));
        assert!(!Active.can_transition(Silent));
        assert!(!Flagged.can_transition(Active));
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(folder()).unwrap();
        assert!(value.get("targetEmail").is_some());
        assert!(value.get("adminPasswordHash").is_some());
        assert_eq!(value.get("status").unwrap(), "silent");
    }
}
