use std::path::PathBuf;

/// Runtime configuration
///
/// The backing repository coordinates are mandatory; everything else has a
/// sensible default. Construction is fail-fast: a missing or malformed
/// value is an error at startup, never a panic later.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token with contents read/write access to the backing repository
    pub github_token: String,
    /// Repository owner (user or organization)
    pub repo_owner: String,
    /// Repository name
    pub repo_name: String,
    /// Branch all reads and writes target
    pub repo_branch: String,
    /// Where the client-side credential cache lives,
    ///  if not set then the platform data directory will be used
    pub local_store_path: Option<PathBuf>,

    // misc
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

const ENV_TOKEN: &str = "DRAFTBOX_GITHUB_TOKEN";
const ENV_OWNER: &str = "DRAFTBOX_REPO_OWNER";
const ENV_NAME: &str = "DRAFTBOX_REPO_NAME";
const ENV_BRANCH: &str = "DRAFTBOX_REPO_BRANCH";
const ENV_LOCAL_STORE: &str = "DRAFTBOX_LOCAL_STORE";
const ENV_LOG: &str = "DRAFTBOX_LOG";

impl Config {
    /// Read configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let github_token = require(ENV_TOKEN)?;
        let repo_owner = require(ENV_OWNER)?;
        let repo_name = require(ENV_NAME)?;
        let repo_branch = std::env::var(ENV_BRANCH).unwrap_or_else(|_| "main".to_string());
        let local_store_path = std::env::var(ENV_LOCAL_STORE).ok().map(PathBuf::from);
        let log_level = match std::env::var(ENV_LOG) {
            Ok(raw) => raw
                .parse::<tracing::Level>()
                .map_err(|_| ConfigError::InvalidVar {
                    var: ENV_LOG,
                    value: raw,
                })?,
            Err(_) => tracing::Level::INFO,
        };

        Ok(Self {
            github_token,
            repo_owner,
            repo_name,
            repo_branch,
            local_store_path,
            log_level,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}
