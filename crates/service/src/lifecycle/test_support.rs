//! Shared fixture for lifecycle tests

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use store::backend::MemoryBackend;
use store::RepoClient;

use crate::clock::ManualClock;
use crate::security::{AbuseTracker, RateLimiter, SecurityManager};

use super::{CreatedEmail, CreatedFolder, Lifecycle, NewEmail, NewFolder};

pub(crate) struct Harness {
    pub lifecycle: Lifecycle,
    pub backend: MemoryBackend,
    pub clock: Arc<ManualClock>,
}

/// A lifecycle wired to an in-memory backend and a manual clock
pub(crate) fn harness() -> Harness {
    let backend = MemoryBackend::new();
    let client = RepoClient::with_limits(
        Arc::new(backend.clone()),
        3,
        Duration::from_millis(200),
    );
    let clock = Arc::new(ManualClock::default());
    let limiter = RateLimiter::new(clock.clone());
    let abuse = AbuseTracker::new(client.clone(), clock.clone());
    let security = SecurityManager::new(limiter, abuse);
    let lifecycle = Lifecycle::new(client, security, clock.clone());
    Harness {
        lifecycle,
        backend,
        clock,
    }
}

impl Harness {
    pub async fn create_folder(&self, name: &str) -> CreatedFolder {
        self.lifecycle
            .create_folder(
                NewFolder {
                    name: name.to_string(),
                    target_email: "a@b.com".to_string(),
                },
                "9.9.9.9",
            )
            .await
            .unwrap()
    }

    pub async fn add_email(&self, folder_id: Uuid, subject: &str) -> CreatedEmail {
        self.lifecycle
            .add_email(
                folder_id,
                NewEmail {
                    subject: subject.to_string(),
                    body: "Body".to_string(),
                    attachments: Vec::new(),
                },
                "8.8.8.8",
            )
            .await
            .unwrap()
    }
}
