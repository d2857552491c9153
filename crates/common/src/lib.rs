/**
 * Cryptographic primitives.
 *  - Password generation, hashing and verification
 *  - Password-keyed symmetric encryption
 *  - Entity checksums and one-way identifiers
 */
pub mod crypto;
/**
 * Persisted entity types.
 * Every entity serializes to camelCase JSON and
 *  carries a trailing `checksum` field covering
 *  all of its other fields.
 */
pub mod models;

pub mod prelude {
    pub use crate::crypto::{
        checksum_of, hash_ip, verify_checksum, Cipher, CipherError, PasswordClass, PasswordHash,
        ShareToken,
    };
    pub use crate::models::{
        Attachment, BlacklistEntry, CredentialKind, CredentialRecord, Email, EmailVersion, Folder,
        FolderStatus, PendingReport, ShareLink, ShareMetadata,
    };
}
