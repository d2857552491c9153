//! Share tokens and one-way IP identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of CSPRNG bytes behind a share token (hex-encodes to 32 chars)
const TOKEN_SIZE: usize = 16;

/// An unguessable share-link token
///
/// The token doubles as the encryption password for the link's metadata, so
/// holding the link is both the locator and the capability to read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    /// Generate a fresh token from the system CSPRNG
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut bytes = [0u8; TOKEN_SIZE];
        getrandom::getrandom(&mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Parse a token received from a link
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == TOKEN_SIZE * 2
            && raw.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase());
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-way hash of a client IP address
///
/// Raw addresses are never written at rest; rate-limit tables, abuse reports
/// and folder records all key on this digest instead.
pub fn hash_ip(ip: &str) -> String {
    hex::encode(Sha256::digest(ip.as_bytes()))
}
