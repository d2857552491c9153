//! Locally cached credential records
//!
//! These never leave the device. Each record keeps a fast verification hash
//! of the password plus an encrypted copy of the plaintext, keyed by the
//! device id so a record copied to another machine is useless and gets
//! purged on the next read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{Cipher, CipherError};

/// What kind of entity a cached password unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Folder,
    Email,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::Folder => f.write_str("folder"),
            CredentialKind::Email => f.write_str("email"),
        }
    }
}

/// A single cached credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub kind: CredentialKind,
    pub entity_id: String,
    /// SHA-256 of the plaintext password, for verification without decrypting
    pub verification_hash: String,
    /// Plaintext password encrypted under the device id
    pub encrypted_password: String,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        kind: CredentialKind,
        entity_id: String,
        password: &str,
        device_id: String,
        now: DateTime<Utc>,
    ) -> Result<Self, CipherError> {
        let encrypted = Cipher::from_password(&device_id).encrypt(&password.to_string())?;
        Ok(Self {
            kind,
            entity_id,
            verification_hash: hex::encode(Sha256::digest(password.as_bytes())),
            encrypted_password: encrypted,
            device_id,
            created_at: now,
            last_used: now,
        })
    }

    /// Cache key: `kind:id`
    pub fn key(&self) -> String {
        Self::key_for(self.kind, &self.entity_id)
    }

    pub fn key_for(kind: CredentialKind, entity_id: &str) -> String {
        format!("{}:{}", kind, entity_id)
    }

    /// Hash-only verification; does not decrypt the stored plaintext
    pub fn verify(&self, password: &str) -> bool {
        self.verification_hash == hex::encode(Sha256::digest(password.as_bytes()))
    }

    /// Recover the plaintext, only on the device the record is bound to
    pub fn open(&self, device_id: &str) -> Option<String> {
        if self.device_id != device_id {
            return None;
        }
        Cipher::from_password(device_id)
            .decrypt(&self.encrypted_password)
            .ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_verify_and_open() {
        let record = CredentialRecord::new(
            CredentialKind::Folder,
            "folder-id".to_string(),
            "hunter2hunter2hunter",
            "device-1".to_string(),
            Utc::now(),
        )
        .unwrap();

        assert!(record.verify("hunter2hunter2hunter"));
        assert!(!record.verify("hunter2"));
        assert_eq!(record.open("device-1").as_deref(), Some("hunter2hunter2hunter"));
    }

    #[test]
    fn test_foreign_device_cannot_open() {
        let record = CredentialRecord::new(
            CredentialKind::Email,
            "email-id".to_string(),
            "password",
            "device-1".to_string(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(record.open("device-2"), None);
    }

    #[test]
    fn test_key_shape() {
        assert_eq!(
            CredentialRecord::key_for(CredentialKind::Folder, "abc"),
            "folder:abc"
        );
    }
}
