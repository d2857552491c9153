//! Opaque document version tokens

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-supplied revision identifier for a stored document
///
/// Required to perform a conditional update or delete. The contents API
/// calls this the blob `sha`; nothing here depends on it being one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VersionToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
