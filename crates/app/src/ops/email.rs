use std::path::PathBuf;

use clap::{Args, Subcommand};
use uuid::Uuid;

use common::models::CredentialKind;
use service::lifecycle::{AttachmentUpload, NewEmail};
use service::CredentialCache;

use super::folder::resolve_password;
use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Email {
    #[command(subcommand)]
    pub command: EmailCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum EmailCommand {
    /// Add a draft to a folder
    Add {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Files to attach; type is inferred from the extension
        #[arg(long)]
        attach: Vec<PathBuf>,
    },
    /// Delete a draft using its content password
    Delete {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        id: Uuid,
        /// Content password; taken from the credential cache when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Like a draft
    Like {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        id: Uuid,
    },
    /// Take a like back
    Unlike {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        id: Uuid,
    },
    /// Download an attachment
    Attachment {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
        /// Where to write the payload; defaults to the attachment name
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub async fn execute(ctx: &OpContext, cmd: Email) -> Result<String, OpError> {
    match cmd.command {
        EmailCommand::Add {
            folder,
            subject,
            body,
            attach,
        } => {
            let mut attachments = Vec::with_capacity(attach.len());
            for path in &attach {
                attachments.push(read_attachment(path)?);
            }

            let created = ctx
                .state
                .lifecycle()
                .add_email(
                    folder,
                    NewEmail {
                        subject,
                        body,
                        attachments,
                    },
                    &ctx.ip,
                )
                .await?;

            let key = CredentialCache::email_key(folder, created.email.id);
            let cached = ctx.state.credentials().save(
                CredentialKind::Email,
                &key,
                &created.content_password,
            )?;
            let cache_note = if cached {
                "saved to the local credential cache"
            } else {
                "NOT cached; it cannot be recovered later"
            };

            Ok(format!(
                "Added email: {} (id: {})\nContent password: {} ({})",
                created.email.subject, created.email.id, created.content_password, cache_note,
            ))
        }
        EmailCommand::Delete {
            folder,
            id,
            password,
        } => {
            let key = CredentialCache::email_key(folder, id);
            let password = resolve_password(ctx, CredentialKind::Email, &key, password)?;
            ctx.state
                .lifecycle()
                .delete_email(folder, id, &password)
                .await?;
            ctx.state.credentials().remove(CredentialKind::Email, &key)?;
            Ok(format!("Deleted email {}", id))
        }
        EmailCommand::Like { folder, id } => {
            let email = ctx
                .state
                .lifecycle()
                .like_email(folder, id, 1, &ctx.ip)
                .await?;
            Ok(format!("{} now has {} likes", email.subject, email.likes))
        }
        EmailCommand::Unlike { folder, id } => {
            let email = ctx
                .state
                .lifecycle()
                .like_email(folder, id, -1, &ctx.ip)
                .await?;
            Ok(format!("{} now has {} likes", email.subject, email.likes))
        }
        EmailCommand::Attachment {
            folder,
            id,
            name,
            out,
        } => {
            let data = ctx
                .state
                .lifecycle()
                .get_attachment(folder, id, &name, &ctx.ip)
                .await?;
            let target = out.unwrap_or_else(|| PathBuf::from(&name));
            std::fs::write(&target, &data)
                .map_err(|e| anyhow::anyhow!("failed to write {}: {}", target.display(), e))?;
            Ok(format!("Wrote {} bytes to {}", data.len(), target.display()))
        }
    }
}

fn read_attachment(path: &PathBuf) -> Result<AttachmentUpload, OpError> {
    let data = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("attachment path has no usable file name"))?
        .to_string();
    let mime_type = mime_for(&name).to_string();
    Ok(AttachmentUpload {
        name,
        mime_type,
        data,
    })
}

fn mime_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "text/plain",
    }
}
