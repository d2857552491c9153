//! Abuse reports and the persistent blacklist
//!
//! Suspicious activity accumulates as timestamped reports keyed by the
//! one-way hash of the offending IP. Once enough reports land inside the
//! rolling window the hash is promoted to a hard blacklist entry and the
//! rate limiter denies everything from it regardless of quota.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{checksum_of, ChecksumError};

/// Reports inside the rolling window that trigger blacklist promotion
pub const REPORTS_TO_BLACKLIST: usize = 3;

/// Rolling window over which reports are counted (7 days)
pub fn report_window() -> Duration {
    Duration::days(7)
}

/// One timestamped abuse report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    /// The denied or reported action, e.g. `folderCreate`
    pub action: String,
    pub reported_at: DateTime<Utc>,
}

/// Accumulated reports against one IP hash, pending promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReport {
    pub ip_hash: String,
    pub reports: Vec<AbuseReport>,
    pub checksum: String,
}

impl PendingReport {
    pub fn new(ip_hash: String) -> Result<Self, ChecksumError> {
        let mut record = Self {
            ip_hash,
            reports: Vec::new(),
            checksum: String::new(),
        };
        record.seal()?;
        Ok(record)
    }

    /// Append a report and reseal
    pub fn record(&mut self, action: String, now: DateTime<Utc>) -> Result<(), ChecksumError> {
        self.reports.push(AbuseReport {
            action,
            reported_at: now,
        });
        self.seal()
    }

    /// Count reports inside the rolling window ending at `now`
    pub fn recent(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - report_window();
        self.reports
            .iter()
            .filter(|r| r.reported_at > cutoff)
            .count()
    }

    /// Whether this record qualifies for blacklist promotion
    pub fn promotable(&self, now: DateTime<Utc>) -> bool {
        self.recent(now) >= REPORTS_TO_BLACKLIST
    }

    pub fn seal(&mut self) -> Result<(), ChecksumError> {
        self.checksum = String::new();
        self.checksum = checksum_of(self)?;
        Ok(())
    }
}

/// A promoted blacklist entry; presence alone denies the IP hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub ip_hash: String,
    pub report_count: usize,
    pub promoted_at: DateTime<Utc>,
    pub checksum: String,
}

impl BlacklistEntry {
    pub fn new(
        ip_hash: String,
        report_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, ChecksumError> {
        let mut entry = Self {
            ip_hash,
            report_count,
            promoted_at: now,
            checksum: String::new(),
        };
        entry.checksum = checksum_of(&entry)?;
        Ok(entry)
    }
}
