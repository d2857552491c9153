pub mod addresses;
pub mod cache;
pub mod email;
pub mod folder;
pub mod share;
pub mod version;

use service::{ServiceError, State};
use store::Bootstrap;

/// Everything an operation needs to run
pub struct OpContext {
    pub state: State,
    pub ip: String,
}

/// Command failures, rendered with the user-facing message rather than the
/// internal error chain
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Default(#[from] anyhow::Error),
}

pub async fn bootstrap(ctx: &OpContext) -> Result<String, OpError> {
    Bootstrap::new(ctx.state.client().clone())
        .ensure_skeleton()
        .await
        .map_err(anyhow::Error::from)?;
    Ok("Repository skeleton ready".to_string())
}
