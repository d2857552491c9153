//! Sliding-window rate limiter
//!
//! Keeps timestamps of actions per `(ip hash, action)` inside the window;
//! a call is denied once the window already holds the quota. State lives in
//! the limiter instance for the life of the process, behind a mutex so the
//! limiter is shareable across concurrent operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::clock::Clock;

/// Rate-limited action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FolderCreate,
    EmailCreate,
    VersionCreate,
    Rate,
    AttachmentDownload,
}

impl Action {
    /// Stable key used in persisted abuse reports
    pub fn key(&self) -> &'static str {
        match self {
            Action::FolderCreate => "folderCreate",
            Action::EmailCreate => "emailCreate",
            Action::VersionCreate => "versionCreate",
            Action::Rate => "rate",
            Action::AttachmentDownload => "attachmentDownload",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A `(max, window)` pair for one action kind
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub max: usize,
    pub window: Duration,
}

impl Quota {
    pub fn new(max: usize, window: Duration) -> Self {
        Self { max, window }
    }
}

fn default_quotas() -> HashMap<Action, Quota> {
    HashMap::from([
        (Action::FolderCreate, Quota::new(3, Duration::hours(1))),
        (Action::EmailCreate, Quota::new(10, Duration::hours(1))),
        (Action::VersionCreate, Quota::new(10, Duration::hours(1))),
        (Action::Rate, Quota::new(30, Duration::hours(1))),
        (
            Action::AttachmentDownload,
            Quota::new(50, Duration::hours(1)),
        ),
    ])
}

#[derive(Debug, Default)]
struct Windows {
    entries: HashMap<(String, Action), Vec<DateTime<Utc>>>,
}

/// The sliding-window limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    quotas: HashMap<Action, Quota>,
    windows: Arc<Mutex<Windows>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_quotas(clock, default_quotas())
    }

    pub fn with_quotas(clock: Arc<dyn Clock>, quotas: HashMap<Action, Quota>) -> Self {
        Self {
            clock,
            quotas,
            windows: Arc::new(Mutex::new(Windows::default())),
        }
    }

    /// Record-and-allow, or deny without recording
    pub fn check(&self, ip_hash: &str, action: Action) -> bool {
        let quota = match self.quotas.get(&action) {
            Some(quota) => *quota,
            // unknown action kinds are unlimited
            None => return true,
        };
        let now = self.clock.now();
        let cutoff = now - quota.window;

        let mut windows = self.windows.lock();
        let timestamps = windows
            .entries
            .entry((ip_hash.to_string(), action))
            .or_default();
        timestamps.retain(|t| *t > cutoff);

        if timestamps.len() >= quota.max {
            return false;
        }
        timestamps.push(now);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max: usize, window: Duration) -> (ManualClock, RateLimiter) {
        let clock = ManualClock::default();
        let limiter = RateLimiter::with_quotas(
            Arc::new(clock.clone()),
            HashMap::from([(Action::FolderCreate, Quota::new(max, window))]),
        );
        (clock, limiter)
    }

    #[test]
    fn test_quota_inside_window() {
        let (_clock, limiter) = limiter(5, Duration::milliseconds(3_600_000));
        for _ in 0..5 {
            assert!(limiter.check("ip-hash", Action::FolderCreate));
        }
        assert!(!limiter.check("ip-hash", Action::FolderCreate));
    }

    #[test]
    fn test_window_expiry_readmits() {
        let (clock, limiter) = limiter(5, Duration::milliseconds(3_600_000));
        for _ in 0..5 {
            assert!(limiter.check("ip-hash", Action::FolderCreate));
        }
        assert!(!limiter.check("ip-hash", Action::FolderCreate));

        clock.advance(Duration::milliseconds(3_600_001));
        assert!(limiter.check("ip-hash", Action::FolderCreate));
    }

    #[test]
    fn test_keys_are_independent() {
        let (_clock, limiter) = limiter(1, Duration::hours(1));
        assert!(limiter.check("a", Action::FolderCreate));
        assert!(!limiter.check("a", Action::FolderCreate));
        assert!(limiter.check("b", Action::FolderCreate));
    }

    #[test]
    fn test_denial_does_not_consume_quota() {
        let (clock, limiter) = limiter(1, Duration::hours(1));
        assert!(limiter.check("a", Action::FolderCreate));
        assert!(!limiter.check("a", Action::FolderCreate));
        clock.advance(Duration::hours(1) + Duration::seconds(1));
        // only the allowed call occupied the window
        assert!(limiter.check("a", Action::FolderCreate));
    }
}
