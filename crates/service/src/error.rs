//! Service error taxonomy
//!
//! One enum for every failure a lifecycle operation can surface. Absence is
//! absorbed into `Option` wherever "not yet created" is a valid state; it
//! becomes [`ServiceError::NotFound`] only when the caller required the
//! entity to exist. User-facing text comes from [`ServiceError::user_message`]:
//! authorization and validation failures are specific and actionable, while
//! integrity and upstream failures get a generic retry message and never
//! leak backend text.

use store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("version conflict after retries")]
    Conflict,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("password verification failed")]
    Unauthorized,
    #[error("integrity check failed for {0}")]
    IntegrityFailure(String),
    #[error("backend call timed out")]
    Timeout,
    #[error("upstream error (status {status})")]
    Upstream { status: u16 },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("service error: {0}")]
    Default(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ServiceError::Conflict,
            StoreError::NotFound => ServiceError::NotFound("document".to_string()),
            StoreError::Timeout => ServiceError::Timeout,
            StoreError::Upstream { status } => ServiceError::Upstream { status },
            StoreError::Codec(e) => ServiceError::Default(anyhow::anyhow!("decode error: {}", e)),
            StoreError::Default(e) => ServiceError::Default(e),
        }
    }
}

impl ServiceError {
    /// Text safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::NotFound(what) => format!("{} could not be found", what),
            ServiceError::Unauthorized => {
                "The password is incorrect. Check it and try again.".to_string()
            }
            ServiceError::RateLimited => {
                "Too many requests from your address. Wait a while and try again.".to_string()
            }
            ServiceError::Validation(detail) => detail.clone(),
            // nothing actionable for the user; no backend detail either
            ServiceError::Conflict
            | ServiceError::IntegrityFailure(_)
            | ServiceError::Timeout
            | ServiceError::Upstream { .. }
            | ServiceError::Default(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
