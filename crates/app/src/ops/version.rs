use clap::{Args, Subcommand, ValueEnum};
use uuid::Uuid;

use service::lifecycle::RatingKind;
use store::paths;

use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Version {
    #[command(subcommand)]
    pub command: VersionCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Rating {
    Like,
    Dislike,
    Use,
}

impl From<Rating> for RatingKind {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Like => RatingKind::Like,
            Rating::Dislike => RatingKind::Dislike,
            Rating::Use => RatingKind::Use,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum VersionCommand {
    /// Publish a new revision of a draft
    Create {
        #[arg(long)]
        folder: Uuid,
        #[arg(long)]
        email: Uuid,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// List revisions of a draft, most used first
    List {
        #[arg(long)]
        email: Uuid,
    },
    /// Rate a revision
    Rate {
        #[arg(long)]
        email: Uuid,
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_enum)]
        rating: Rating,
    },
}

pub async fn execute(ctx: &OpContext, cmd: Version) -> Result<String, OpError> {
    match cmd.command {
        VersionCommand::Create {
            folder,
            email,
            subject,
            body,
        } => {
            let version = ctx
                .state
                .lifecycle()
                .create_version(folder, email, subject, body, &ctx.ip)
                .await?;
            Ok(format!(
                "Created version {} of email {} (id: {})",
                version.version, email, version.id
            ))
        }
        VersionCommand::List { email } => {
            let listed = ctx.state.lifecycle().list_versions(email).await?;
            if listed.versions.is_empty() {
                return Ok(format!("No versions for email {}", email));
            }
            let mut out = String::new();
            for version in listed.versions {
                out.push_str(&format!(
                    "v{}  {}  (used {}, +{}/-{})\n",
                    version.version, version.id, version.usage_count, version.likes, version.dislikes
                ));
            }
            Ok(out.trim_end().to_string())
        }
        VersionCommand::Rate { email, id, rating } => {
            let path = paths::email_version(&email.to_string(), id);
            let version = ctx
                .state
                .lifecycle()
                .rate_version(&path, rating.into(), &ctx.ip)
                .await?;
            Ok(format!(
                "Version {} now at used {}, +{}/-{}",
                version.id, version.usage_count, version.likes, version.dislikes
            ))
        }
    }
}
