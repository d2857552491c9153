//! Share links
//!
//! A share link is a capability: the token locates the document *and* keys
//! the encryption of its metadata, so only someone holding the link can
//! read what it points at. One folder may have any number of live tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{checksum_of, ChecksumError, Cipher, CipherError, ShareToken};

/// Plaintext form of the encrypted share-link metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMetadata {
    pub name: String,
    pub target_email: String,
    pub created_at: DateTime<Utc>,
}

/// A stored share link pointing at a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub token: ShareToken,
    pub folder_id: Uuid,
    /// Metadata encrypted under the token itself (hex nonce || ciphertext)
    pub metadata: String,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareLinkError {
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
}

impl ShareLink {
    /// Build a link for a folder, encrypting the metadata under the token
    pub fn new(
        token: ShareToken,
        folder_id: Uuid,
        metadata: &ShareMetadata,
        now: DateTime<Utc>,
    ) -> Result<Self, ShareLinkError> {
        let encrypted = Cipher::from_password(token.as_str()).encrypt(metadata)?;
        let mut link = Self {
            token,
            folder_id,
            metadata: encrypted,
            created_at: now,
            checksum: String::new(),
        };
        link.checksum = checksum_of(&link)?;
        Ok(link)
    }

    /// Decrypt the metadata with the link's own token
    pub fn open_metadata(&self) -> Result<ShareMetadata, ShareLinkError> {
        Ok(Cipher::from_password(self.token.as_str()).decrypt(&self.metadata)?)
    }

    pub fn integrity_ok(&self) -> bool {
        checksum_of(self).map(|c| c == self.checksum).unwrap_or(false)
    }
}
