//! Version records for email drafts and country address lists
//!
//! Versions form an append-only sequence per original. The `version` number
//! is assigned as "count of existing versions + 1" at creation time and is
//! never regenerated on delete; documents are keyed by UUID, so two
//! concurrent creators may display the same number but can never collide on
//! a storage path. Listings sort by usage count, then likes, so the number
//! is a display hint only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{checksum_of, ChecksumError};

/// The versioned payload: a draft revision or a country address list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VersionPayload {
    #[serde(rename_all = "camelCase")]
    Draft { subject: String, body: String },
    #[serde(rename_all = "camelCase")]
    AddressList { addresses: Vec<String> },
}

/// One version of an email draft or a country email list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVersion {
    pub id: Uuid,
    /// Email id or country code this version belongs to
    pub original_id: String,
    /// Display-only sequence number (existing count + 1 at creation)
    pub version: u64,
    pub payload: VersionPayload,
    pub likes: u64,
    pub dislikes: u64,
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub checksum: String,
}

impl EmailVersion {
    pub fn new(
        original_id: String,
        version: u64,
        payload: VersionPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, ChecksumError> {
        let mut record = Self {
            id: Uuid::new_v4(),
            original_id,
            version,
            payload,
            likes: 0,
            dislikes: 0,
            usage_count: 0,
            created_at: now,
            updated_at: now,
            checksum: String::new(),
        };
        record.seal()?;
        Ok(record)
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

    #[test]
    fn test_version_sealed_on_creation() {
        let version = EmailVersion::new(
            Uuid::new_v4().to_string(),
            1,
            VersionPayload::Draft {
                subject: "Subject".to_string(),
                body: "Body".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        assert!(version.integrity_ok());
        assert_eq!(version.version, 1);
    }

    #[test]
    fn test_payload_tagging() {
        let list = EmailVersion::new(
            "de".to_string(),
            2,
            VersionPayload::AddressList {
                addresses: vec!["mp@example.de".to_string()],
            },
            Utc::now(),
        )
        .unwrap();
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["payload"]["kind"], "addressList");
        let back: EmailVersion = serde_json::from_value(value).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_counter_mutation_changes_checksum() {
        let mut version = EmailVersion::new(
            "de".to_string(),
            1,
            VersionPayload::AddressList { addresses: vec![] },
            Utc::now(),
        )
        .unwrap();
        let before = version.checksum.clone();
        version.usage_count += 1;
        version.seal().unwrap();
        assert_ne!(before, version.checksum);
    }
}
