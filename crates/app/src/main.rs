//! draftbox - anonymous, moderated draft folders on a contents-API store
//!
//! Every command talks straight to the backing repository; there is no
//! server in between. Rate accounting keys off the caller-supplied address
//! and is advisory at this layer.

mod ops;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use service::{Config, State};

use ops::OpContext;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address used for rate accounting; only its hash ever leaves the
    /// process
    #[arg(long, default_value = "127.0.0.1")]
    ip: String,

    /// Log level (error, warn, info, debug, trace); overrides DRAFTBOX_LOG
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, inspect and moderate folders
    Folder(ops::folder::Folder),
    /// Work with drafts inside a folder
    Email(ops::email::Email),
    /// Draft revisions and community ratings
    Version(ops::version::Version),
    /// Country address lists
    Addresses(ops::addresses::Addresses),
    /// Resolve share links
    Share(ops::share::Share),
    /// The local credential cache
    Cache(ops::cache::Cache),
    /// Create the repository directory skeleton
    Bootstrap,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing; the flag wins over DRAFTBOX_LOG
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_level = args
        .log_level
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(config.log_level);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    let state = match State::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: failed to set up state: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = OpContext {
        state,
        ip: args.ip,
    };

    let result = match args.command {
        Command::Folder(cmd) => ops::folder::execute(&ctx, cmd).await,
        Command::Email(cmd) => ops::email::execute(&ctx, cmd).await,
        Command::Version(cmd) => ops::version::execute(&ctx, cmd).await,
        Command::Addresses(cmd) => ops::addresses::execute(&ctx, cmd).await,
        Command::Share(cmd) => ops::share::execute(&ctx, cmd).await,
        Command::Cache(cmd) => ops::cache::execute(&ctx, cmd).await,
        Command::Bootstrap => ops::bootstrap(&ctx).await,
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
