use clap::{Args, Subcommand};

use common::crypto::ShareToken;

use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Share {
    #[command(subcommand)]
    pub command: ShareCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShareCommand {
    /// Resolve a share link token to its folder
    Resolve {
        #[arg(long)]
        token: String,
    },
}

pub async fn execute(ctx: &OpContext, cmd: Share) -> Result<String, OpError> {
    match cmd.command {
        ShareCommand::Resolve { token } => {
            let token = ShareToken::parse(&token)
                .ok_or_else(|| anyhow::anyhow!("not a valid share link token"))?;
            let shared = ctx.state.lifecycle().resolve_share_link(&token).await?;
            Ok(format!(
                "{} (id: {}, {})\nFor: {}\nCreated: {}\nEmails: {}",
                shared.metadata.name,
                shared.folder.id,
                shared.folder.status,
                shared.metadata.target_email,
                shared.metadata.created_at,
                shared.folder.emails.len(),
            ))
        }
    }
}
