//! Entity checksums over canonical JSON
//!
//! Every persisted entity ends in a `checksum` field covering all of its
//! other fields. The digest is SHA-256 over the entity's JSON serialization
//! with the `checksum` field removed; `serde_json` keeps object keys sorted,
//! which makes the serialization canonical.

use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("entity does not serialize to a JSON object")]
    NotAnObject,
    #[error("entity failed to serialize: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compute the hex SHA-256 checksum of an entity, ignoring its `checksum` field
pub fn checksum_of<T: Serialize>(entity: &T) -> Result<String, ChecksumError> {
    let mut value = serde_json::to_value(entity)?;
    let map = value.as_object_mut().ok_or(ChecksumError::NotAnObject)?;
    map.remove("checksum");
    let canonical = serde_json::to_string(&value)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Check a stored checksum against the entity's current fields
pub fn verify_checksum<T: Serialize>(entity: &T, stored: &str) -> Result<bool, ChecksumError> {
    Ok(checksum_of(entity)? == stored)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Entity {
        id: String,
        likes: u64,
        checksum: String,
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let a = Entity {
            id: "abc".to_string(),
            likes: 3,
            checksum: String::new(),
        };
        let b = Entity {
            id: "abc".to_string(),
            likes: 3,
            checksum: "deadbeef".to_string(),
        };
        assert_eq!(checksum_of(&a).unwrap(), checksum_of(&b).unwrap());
    }

    #[test]
    fn test_any_field_change_alters_checksum() {
        let base = Entity {
            id: "abc".to_string(),
            likes: 3,
            checksum: String::new(),
        };
        let id_changed = Entity {
            id: "abd".to_string(),
            likes: 3,
            checksum: String::new(),
        };
        let likes_changed = Entity {
            id: "abc".to_string(),
            likes: 4,
            checksum: String::new(),
        };
        let original = checksum_of(&base).unwrap();
        assert_ne!(original, checksum_of(&id_changed).unwrap());
        assert_ne!(original, checksum_of(&likes_changed).unwrap());
    }

    #[test]
    fn test_verify_checksum() {
        let entity = Entity {
            id: "abc".to_string(),
            likes: 0,
            checksum: String::new(),
        };
        let digest = checksum_of(&entity).unwrap();
        assert!(verify_checksum(&entity, &digest).unwrap());
        assert!(!verify_checksum(&entity, "0000").unwrap());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            checksum_of(&"just a string"),
            Err(ChecksumError::NotAnObject)
        ));
    }
}
