//! Draft and address-list versioning

use uuid::Uuid;

use common::models::{EmailVersion, VersionPayload};
use store::{paths, StoreError};

use super::Lifecycle;
use crate::error::ServiceError;
use crate::security::Action;

/// The three community signals a version can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingKind {
    Like,
    Dislike,
    Use,
}

/// Versions of one original, ordered for display
#[derive(Debug)]
pub struct VersionList {
    pub versions: Vec<EmailVersion>,
}

impl Lifecycle {
    /// Append a draft revision to an email
    pub async fn create_version(
        &self,
        folder_id: Uuid,
        email_id: Uuid,
        subject: String,
        body: String,
        ip: &str,
    ) -> Result<EmailVersion, ServiceError> {
        if subject.trim().is_empty() {
            return Err(ServiceError::Validation("subject is required".to_string()));
        }
        self.security().authorize(ip, Action::VersionCreate).await?;
        // the original must exist before a revision can hang off it
        self.load_email(folder_id, email_id).await?;

        let original_id = email_id.to_string();
        let dir = paths::email_versions_dir(&original_id);
        let version = self
            .append_version(&dir, original_id, VersionPayload::Draft { subject, body })
            .await?;
        tracing::info!(email = %email_id, number = version.version, "draft version created");
        Ok(version)
    }

    /// Append a revision of a country's address list
    pub async fn create_list_version(
        &self,
        country: &str,
        addresses: Vec<String>,
        ip: &str,
    ) -> Result<EmailVersion, ServiceError> {
        let country = country.to_ascii_lowercase();
        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(ServiceError::Validation(
                "country must be a two-letter code".to_string(),
            ));
        }
        if addresses.is_empty() {
            return Err(ServiceError::Validation(
                "address list must not be empty".to_string(),
            ));
        }
        self.security().authorize(ip, Action::VersionCreate).await?;

        let dir = paths::list_versions_dir(&country);
        let version = self
            .append_version(&dir, country.clone(), VersionPayload::AddressList { addresses })
            .await?;
        tracing::info!(country, number = version.version, "list version created");
        Ok(version)
    }

    /// Record a like, dislike or use on a version document
    ///
    /// The counters live in the document itself, so the merge-aware update
    /// keeps concurrent ratings from overwriting each other.
    pub async fn rate_version(
        &self,
        path: &str,
        kind: RatingKind,
        ip: &str,
    ) -> Result<EmailVersion, ServiceError> {
        self.security().authorize(ip, Action::Rate).await?;

        let now = self.now();
        let (version, _) = self
            .client()
            .update::<EmailVersion, _>(path, "rate version", |mut version| {
                if !version.integrity_ok() {
                    return Err(StoreError::Default(anyhow::anyhow!("checksum mismatch")));
                }
                match kind {
                    RatingKind::Like => version.likes += 1,
                    RatingKind::Dislike => version.dislikes += 1,
                    RatingKind::Use => version.usage_count += 1,
                }
                version
                    .touch(now)
                    .map_err(|e| StoreError::Default(e.into()))?;
                Ok(version)
            })
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::NotFound(format!("version at {}", path)),
                other => other.into(),
            })?;
        Ok(version)
    }

    /// Versions of an email, most used first
    pub async fn list_versions(&self, email_id: Uuid) -> Result<VersionList, ServiceError> {
        self.list_versions_in(&paths::email_versions_dir(&email_id.to_string()))
            .await
    }

    /// Versions of a country address list, most used first
    pub async fn list_list_versions(&self, country: &str) -> Result<VersionList, ServiceError> {
        self.list_versions_in(&paths::list_versions_dir(&country.to_ascii_lowercase()))
            .await
    }

    async fn list_versions_in(&self, dir: &str) -> Result<VersionList, ServiceError> {
        let mut versions = Vec::new();
        for entry in self.client().list(dir).await? {
            if entry.is_dir || !entry.name.ends_with(".json") {
                continue;
            }
            let path = format!("{}/{}", dir, entry.name);
            let Some(doc) = self.client().get::<EmailVersion>(&path).await? else {
                continue;
            };
            if !doc.body.integrity_ok() {
                return Err(ServiceError::IntegrityFailure(path));
            }
            versions.push(doc.body);
        }
        versions.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then(b.likes.cmp(&a.likes))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(VersionList { versions })
    }

    async fn append_version(
        &self,
        dir: &str,
        original_id: String,
        payload: VersionPayload,
    ) -> Result<EmailVersion, ServiceError> {
        let existing = self
            .client()
            .list(dir)
            .await?
            .iter()
            .filter(|e| !e.is_dir && e.name.ends_with(".json"))
            .count() as u64;

        let version = EmailVersion::new(original_id, existing + 1, payload, self.now())
            .map_err(|e| anyhow::anyhow!("seal error: {}", e))?;
        self.client()
            .create(
                &format!("{}/{}.json", dir, version.id),
                &version,
                "create version",
            )
            .await?;
        Ok(version)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lifecycle::test_support::harness;

    #[tokio::test]
    async fn test_version_numbers_count_up() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let email = h.add_email(folder.folder.id, "Subject").await;

        let first = h
            .lifecycle
            .create_version(
                folder.folder.id,
                email.email.id,
                "Subject v2".to_string(),
                "Body".to_string(),
                "1.2.3.4",
            )
            .await
            .unwrap();
        let second = h
            .lifecycle
            .create_version(
                folder.folder.id,
                email.email.id,
                "Subject v3".to_string(),
                "Body".to_string(),
                "1.2.3.4",
            )
            .await
            .unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_versions_ordered_by_usage_then_likes() {
        let h = harness();
        let folder = h.create_folder("Test").await;
        let email = h.add_email(folder.folder.id, "Subject").await;

        let mut ids = Vec::new();
        for i in 0..3 {
            let v = h
                .lifecycle
                .create_version(
                    folder.folder.id,
                    email.email.id,
                    format!("Revision {}", i),
                    String::new(),
                    "1.2.3.4",
                )
                .await
                .unwrap();
            ids.push(v.id);
        }

        let original_id = email.email.id.to_string();
        let path_of = |id: &Uuid| paths::email_version(&original_id, *id);
        h.lifecycle
            .rate_version(&path_of(&ids[2]), RatingKind::Use, "1.2.3.4")
            .await
            .unwrap();
        h.lifecycle
            .rate_version(&path_of(&ids[1]), RatingKind::Like, "1.2.3.4")
            .await
            .unwrap();
        h.lifecycle
            .rate_version(&path_of(&ids[0]), RatingKind::Dislike, "1.2.3.4")
            .await
            .unwrap();

        let listed = h.lifecycle.list_versions(email.email.id).await.unwrap();
        assert_eq!(listed.versions[0].id, ids[2]);
        assert_eq!(listed.versions[1].id, ids[1]);
        assert_eq!(listed.versions[2].id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_versions_per_country() {
        let h = harness();
        let version = h
            .lifecycle
            .create_list_version(
                "DE",
                vec!["mp@example.de".to_string()],
                "1.2.3.4",
            )
            .await
            .unwrap();
        assert_eq!(version.version, 1);

        let listed = h.lifecycle.list_list_versions("de").await.unwrap();
        assert_eq!(listed.versions.len(), 1);
        assert!(h.lifecycle.list_list_versions("fr").await.unwrap().versions.is_empty());
    }

    #[tokio::test]
    async fn test_country_code_validated() {
        let h = harness();
        let result = h
            .lifecycle
            .create_list_version("deu", vec!["a@b.de".to_string()], "1.2.3.4")
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
