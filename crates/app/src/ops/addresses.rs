use clap::{Args, Subcommand};
use uuid::Uuid;

use service::lifecycle::RatingKind;
use store::paths;

use super::version::Rating;
use super::{OpContext, OpError};

#[derive(Args, Debug, Clone)]
pub struct Addresses {
    #[command(subcommand)]
    pub command: AddressesCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddressesCommand {
    /// Publish a new version of a country's address list
    Publish {
        /// Two-letter country code
        #[arg(long)]
        country: String,
        /// Recipient addresses, one flag per address
        #[arg(long, required = true)]
        address: Vec<String>,
    },
    /// List versions of a country's address list, most used first
    List {
        #[arg(long)]
        country: String,
    },
    /// Rate an address-list version
    Rate {
        #[arg(long)]
        country: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_enum)]
        rating: Rating,
    },
}

pub async fn execute(ctx: &OpContext, cmd: Addresses) -> Result<String, OpError> {
    match cmd.command {
        AddressesCommand::Publish { country, address } => {
            let version = ctx
                .state
                .lifecycle()
                .create_list_version(&country, address, &ctx.ip)
                .await?;
            Ok(format!(
                "Published version {} of the {} list (id: {})",
                version.version, version.original_id, version.id
            ))
        }
        AddressesCommand::List { country } => {
            let listed = ctx.state.lifecycle().list_list_versions(&country).await?;
            if listed.versions.is_empty() {
                return Ok(format!("No address lists for {}", country));
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
        AddressesCommand::Rate { country, id, rating } => {
            let path = paths::list_version(&country.to_ascii_lowercase(), id);
            let kind: RatingKind = rating.into();
            let version = ctx
                .state
                .lifecycle()
                .rate_version(&path, kind, &ctx.ip)
                .await?;
            Ok(format!(
                "Version {} now at used {}, +{}/-{}",
                version.id, version.usage_count, version.likes, version.dislikes
            ))
        }
    }
}
