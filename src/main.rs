//! Command-line entry point: digest the latest breakdown email once and exit.
//!
//! Settings come from the environment (optionally a dotenv file):
//!
//! ```bash
//! export DIGEST_IMAP_EMAIL="you@gmail.com"
//! export DIGEST_IMAP_PASSWORD="app-password"
//! export LABEL_NAME="Breakdowns"
//! export TELEGRAM_BOT_TOKEN="123:abc"
//! export TELEGRAM_CHAT_ID="-1001234"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=casting_digest=debug
//!
//! casting-digest
//! casting-digest --eml saved.eml --dry-run
//! ```

use casting_digest::config::{state_file_from_env, MailboxConfig, TelegramConfig};
use casting_digest::mailbox::{EmlFile, LabelMailbox, MailSource};
use casting_digest::notifier::{Notifier, StdoutNotifier, TelegramNotifier};
use casting_digest::state::{FileStateStore, MemoryStateStore, StateStore};
use casting_digest::{run_digest, RunOutcome};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(
    name = "casting-digest",
    version,
    about = "Post the latest casting breakdown email as per-project chat messages"
)]
struct Cli {
    /// Load settings from this dotenv file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Digest a saved message instead of reading the IMAP label
    #[arg(long, value_name = "PATH")]
    eml: Option<PathBuf>,

    /// Print messages instead of sending them, and do not record state
    #[arg(long)]
    dry_run: bool,

    /// Where the last processed message id is kept [default: $DIGEST_STATE_FILE or state.txt]
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Enable debug logging for this crate
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load settings before the logger so RUST_LOG may come from the dotenv file
    let env_loaded = load_env(cli.env_file.as_deref());
    init_logger(cli.verbose);

    info!(version = env!("CARGO_PKG_VERSION"), "casting-digest starting");

    if let Err(e) = env_loaded {
        error!(error = %e, "Failed to load environment file");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(outcome) => {
            if let RunOutcome::Processed(summary) = &outcome {
                info!(
                    groups = summary.groups,
                    sent = summary.sent,
                    "Run finished"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, category = %e.category(), "Digest run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> casting_digest::Result<RunOutcome> {
    let notifier: Box<dyn Notifier> = if cli.dry_run {
        Box::new(StdoutNotifier)
    } else {
        Box::new(TelegramNotifier::new(TelegramConfig::from_env()?)?)
    };

    let state: Box<dyn StateStore> = if cli.dry_run || cli.eml.is_some() {
        Box::new(MemoryStateStore::new())
    } else {
        let path = cli.state_file.unwrap_or_else(state_file_from_env);
        Box::new(FileStateStore::new(path))
    };

    if let Some(path) = cli.eml {
        let mut source = EmlFile::new(path);
        return run_digest(&mut source, state.as_ref(), notifier.as_ref()).await;
    }

    let mut mailbox = LabelMailbox::connect(MailboxConfig::from_env()?).await?;
    let outcome = run_digest(&mut mailbox, state.as_ref(), notifier.as_ref()).await;

    if let Err(e) = mailbox.close().await {
        warn!(error = %e, "Logout failed");
    }

    outcome
}

fn load_env(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path),
        None => match dotenvy::dotenv() {
            Err(e) if e.not_found() => Ok(()),
            other => other.map(|_| ()),
        },
    }
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "casting_digest=debug,info"
    } else {
        "casting_digest=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
