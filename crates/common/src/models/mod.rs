//! Persisted entity types
//!
//! One JSON document per entity, stored at a deterministic path in the
//! contents repository. Every document serializes with camelCase field
//! names and ends in a `checksum` field covering all the others
//! (see [`crate::crypto::checksum_of`]).

mod credential;
mod email;
mod folder;
mod moderation;
mod share_link;
mod version;

pub use credential::{CredentialKind, CredentialRecord};
pub use email::{
    Attachment, Email, ALLOWED_MIME_TYPES, MAX_ATTACHMENT_SIZE_FORM, MAX_ATTACHMENT_SIZE_STORED,
};
pub use folder::{Folder, FolderStatus};
pub use moderation::{AbuseReport, BlacklistEntry, PendingReport, REPORTS_TO_BLACKLIST};
pub use share_link::{ShareLink, ShareMetadata};
pub use version::{EmailVersion, VersionPayload};
