//! Deterministic path layout
//!
//! Single source of truth for where entities live in the repository.
//! Folder documents sit under the segment matching their moderation status;
//! emails and attachments are status-independent so that approving a folder
//! moves exactly one document.

use common::models::FolderStatus;
use uuid::Uuid;

/// Top-level directories the bootstrap manager guarantees exist
pub const SKELETON: &[&str] = &[
    "folders/silent",
    "folders/active",
    "folders/flagged",
    "emails",
    "attachments",
    "versions/emails",
    "versions/lists",
    "share-links",
    "moderation/reports",
    "moderation/blacklist",
];

pub fn folder(status: FolderStatus, id: Uuid) -> String {
    format!("folders/{}/{}.json", status.segment(), id)
}

pub fn emails_dir(folder_id: Uuid) -> String {
    format!("emails/{}", folder_id)
}

pub fn email(folder_id: Uuid, email_id: Uuid) -> String {
    format!("emails/{}/{}.json", folder_id, email_id)
}

pub fn attachments_dir(folder_id: Uuid, email_id: Uuid) -> String {
    format!("attachments/{}/{}", folder_id, email_id)
}

pub fn attachment(folder_id: Uuid, email_id: Uuid, name: &str) -> String {
    format!("attachments/{}/{}/{}", folder_id, email_id, name)
}

pub fn email_versions_dir(original_id: &str) -> String {
    format!("versions/emails/{}", original_id)
}

pub fn email_version(original_id: &str, version_id: Uuid) -> String {
    format!("versions/emails/{}/{}.json", original_id, version_id)
}

pub fn list_versions_dir(country: &str) -> String {
    format!("versions/lists/{}", country)
}

pub fn list_version(country: &str, version_id: Uuid) -> String {
    format!("versions/lists/{}/{}.json", country, version_id)
}

pub fn share_link(token: &str) -> String {
    format!("share-links/{}.json", token)
}

pub fn share_links_dir() -> String {
    "share-links".to_string()
}

pub fn pending_report(ip_hash: &str) -> String {
    format!("moderation/reports/{}.json", ip_hash)
}

pub fn blacklist_entry(ip_hash: &str) -> String {
    format!("moderation/blacklist/{}.json", ip_hash)
}

/// Marker file that makes an otherwise-empty directory exist
pub fn keep_marker(dir: &str) -> String {
    format!("{}/.keep", dir.trim_end_matches('/'))
}
