use clap::{Args, Subcommand};
use uuid::Uuid;

use common::models::CredentialKind;
use service::lifecycle::NewFolder;

use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Folder {
    #[command(subcommand)]
    pub command: FolderCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FolderCommand {
    /// Create a new folder; it stays unlisted until approved
    Create {
        /// Display name of the folder
        #[arg(long)]
        name: String,
        /// Address the drafts are meant for
        #[arg(long)]
        target_email: String,
    },
    /// Delete a folder and everything in it
    Delete {
        #[arg(long)]
        id: Uuid,
        /// Admin password; taken from the credential cache when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List publicly visible folders
    List,
    /// Run the approval check for a folder
    Check {
        #[arg(long)]
        id: Uuid,
    },
    /// Report a folder for abuse
    Report {
        #[arg(long)]
        id: Uuid,
    },
}

pub async fn execute(ctx: &OpContext, cmd: Folder) -> Result<String, OpError> {
    match cmd.command {
        FolderCommand::Create { name, target_email } => {
            let created = ctx
                .state
                .lifecycle()
                .create_folder(NewFolder { name, target_email }, &ctx.ip)
                .await?;

            let cached = ctx.state.credentials().save(
                CredentialKind::Folder,
                &created.folder.id.to_string(),
                &created.admin_password,
            )?;
            let cache_note = if cached {
                "saved to the local credential cache"
            } else {
                "NOT cached; losing it means losing admin access"
            };

            Ok(format!(
                "Created folder: {} (id: {})\nShare link token: {}\nAdmin password: {} ({})",
                created.folder.name,
                created.folder.id,
                created.share_token,
                created.admin_password,
                cache_note,
            ))
        }
        FolderCommand::Delete { id, password } => {
            let password = resolve_password(ctx, CredentialKind::Folder, &id.to_string(), password)?;
            ctx.state.lifecycle().delete_folder(id, &password).await?;
            ctx.state
                .credentials()
                .remove(CredentialKind::Folder, &id.to_string())?;
            Ok(format!("Deleted folder {}", id))
        }
        FolderCommand::List => {
            let folders = ctx.state.lifecycle().list_folders().await?;
            if folders.is_empty() {
                return Ok("No public folders".to_string());
            }
            let mut out = String::new();
            for folder in folders {
                out.push_str(&format!(
                    "{}  {}  (for {}, {} emails)\n",
                    folder.id,
                    folder.name,
                    folder.target_email,
                    folder.emails.len()
                ));
            }
            Ok(out.trim_end().to_string())
        }
        FolderCommand::Check { id } => {
            let status = ctx.state.lifecycle().check_approval(id).await?;
            Ok(format!("Folder {} is {}", id, status))
        }
        FolderCommand::Report { id } => {
            let status = ctx.state.lifecycle().report_folder(id).await?;
            Ok(format!("Report filed; folder {} is {}", id, status))
        }
    }
}

/// Explicit password, or fall back to the credential cache
pub(crate) fn resolve_password(
    ctx: &OpContext,
    kind: CredentialKind,
    entity_id: &str,
    explicit: Option<String>,
) -> Result<String, OpError> {
    if let Some(password) = explicit {
        return Ok(password);
    }
    ctx.state
        .credentials()
        .get(kind, entity_id)
        .ok_or_else(|| anyhow::anyhow!("no password given and none cached for this entry").into())
}
