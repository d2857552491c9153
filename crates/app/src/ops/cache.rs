use clap::{Args, Subcommand, ValueEnum};
use common::models::CredentialKind;

use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Cache {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheCommand {
    /// Allow or forbid caching of generated passwords on this device
    Consent {
        #[arg(long, conflicts_with = "deny")]
        grant: bool,
        #[arg(long)]
        deny: bool,
    },
    /// Show which credentials are cached (never the passwords themselves)
    List,
    /// Delete the remote entities this cache holds passwords for, then
    /// wipe the matching records
    KillSwitch {
        /// Required confirmation; the deletions cannot be undone
        #[arg(long)]
        yes: bool,
        /// Limit the run to one credential kind; omit to cover everything
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Kind {
    Folder,
    Email,
}

impl From<Kind> for CredentialKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Folder => CredentialKind::Folder,
            Kind::Email => CredentialKind::Email,
        }
    }
}

pub async fn execute(ctx: &OpContext, cmd: Cache) -> Result<String, OpError> {
    match cmd.command {
        CacheCommand::Consent { grant, deny } => {
            if !grant && !deny {
                return match ctx.state.credentials().consent() {
                    Some(true) => Ok("Caching is allowed".to_string()),
                    Some(false) => Ok("Caching is denied".to_string()),
                    None => Ok("Caching consent has not been given yet".to_string()),
                };
            }
            ctx.state.credentials().set_consent(grant);
            Ok(if grant {
                "Generated passwords will be cached on this device".to_string()
            } else {
                "Generated passwords will not be cached".to_string()
            })
        }
        CacheCommand::List => {
            let records = ctx.state.credentials().records();
            if records.is_empty() {
                return Ok("No cached credentials".to_string());
            }
            let mut out = String::new();
            for record in records {
                out.push_str(&format!(
                    "{}  {}  (last used {})\n",
                    record.kind, record.entity_id, record.last_used
                ));
            }
            Ok(out.trim_end().to_string())
        }
        CacheCommand::KillSwitch { yes, kind } => {
            if !yes {
                return Err(anyhow::anyhow!(
                    "kill-switch deletes the cached folders and emails it covers; \
                     pass --yes to confirm"
                )
                .into());
            }
            let report = ctx
                .state
                .credentials()
                .kill_switch(ctx.state.lifecycle(), kind.map(CredentialKind::from))
                .await;
            Ok(format!(
                "Kill switch done: {} deleted, {} failed; matching records wiped",
                report.deleted, report.failed
            ))
        }
    }
}
