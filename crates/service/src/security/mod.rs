//! Abuse control
//!
//! Three cooperating pieces:
//!
//! - [`RateLimiter`]: in-memory sliding windows per `(ip hash, action)`,
//!   advisory at the client layer (a determined actor bypassing the client
//!   is not stopped; there is no server to enforce more)
//! - [`AbuseTracker`]: persists suspicious-activity reports keyed by the
//!   one-way IP hash and promotes repeat offenders to a hard blacklist
//! - [`SecurityManager`]: the single gate lifecycle operations call before
//!   doing anything on behalf of an IP

mod abuse;
mod rate_limit;

use std::sync::Arc;

pub use abuse::AbuseTracker;
pub use rate_limit::{Action, Quota, RateLimiter};

use common::crypto::hash_ip;

use crate::clock::Clock;
use crate::error::ServiceError;

/// The admission gate in front of every rate-limited operation
#[derive(Debug, Clone)]
pub struct SecurityManager {
    limiter: RateLimiter,
    abuse: AbuseTracker,
}

impl SecurityManager {
    pub fn new(limiter: RateLimiter, abuse: AbuseTracker) -> Self {
        Self { limiter, abuse }
    }

    /// Admit or deny an action for an IP
    ///
    /// Blacklisted IP hashes are denied regardless of quota. A quota denial
    /// files a suspicious-activity report, which can itself promote the
    /// hash onto the blacklist.
    pub async fn authorize(&self, ip: &str, action: Action) -> Result<(), ServiceError> {
        let ip_hash = hash_ip(ip);

        if self.abuse.is_blacklisted(&ip_hash).await? {
            tracing::warn!(%action, ip_hash, "blacklisted ip denied");
            return Err(ServiceError::RateLimited);
        }

        if !self.limiter.check(&ip_hash, action) {
            tracing::warn!(%action, ip_hash, "rate limit exceeded");
            self.abuse.flag(&ip_hash, action).await?;
            return Err(ServiceError::RateLimited);
        }

        Ok(())
    }

    pub fn abuse(&self) -> &AbuseTracker {
        &self.abuse
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        self.abuse.clock()
    }
}
