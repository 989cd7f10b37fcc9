//! # casting-digest
//!
//! Turns the latest casting-breakdown email in a mail label into one chat notification per
//! project.
//!
//! This crate provides:
//! - A pure extraction engine ([`listing`]) that recovers role listings from the plain-text
//!   body, project captions from the HTML body, joins them by breakdown id and renders messages
//! - An IMAP [`mailbox`] source reading the most recent message of a label
//! - A [`notifier`] delivering messages to Telegram
//! - A [`state`] store remembering the last processed message, so reruns are no-ops
//!
//! ## Quick Start
//!
//! ```no_run
//! use casting_digest::mailbox::LabelMailbox;
//! use casting_digest::notifier::TelegramNotifier;
//! use casting_digest::state::FileStateStore;
//! use casting_digest::{run_digest, MailboxConfig, MailSource, RunOutcome, TelegramConfig};
//!
//! # async fn example() -> casting_digest::Result<()> {
//! let mut mailbox = LabelMailbox::connect(MailboxConfig::from_env()?).await?;
//! let notifier = TelegramNotifier::new(TelegramConfig::from_env()?)?;
//! let state = FileStateStore::new("state.txt");
//!
//! if let RunOutcome::Processed(summary) = run_digest(&mut mailbox, &state, &notifier).await? {
//!     println!("sent {} of {} projects", summary.sent, summary.groups);
//! }
//! mailbox.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Extraction Only
//!
//! The engine needs no I/O and never fails:
//!
//! ```
//! use casting_digest::listing::build_digest;
//!
//! let digest = build_digest("no listings here", "<p>nor here</p>");
//! assert!(digest.messages.is_empty());
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. Mailbox operations emit spans named
//! `LabelMailbox::connect`, `session::select_label`, `session::fetch_raw` and so on; a run is
//! wrapped in `runner::run_digest` and ends with an `info` event carrying `sent_projects`,
//! `skipped_vertical_projects` and `parsed_roles`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod listing;
pub mod mailbox;
pub mod notifier;
pub mod runner;
pub mod state;

// Internal modules
mod connection;
mod parser;
mod session;

// Re-exports for ergonomic API
pub use config::{MailboxConfig, MailboxConfigBuilder, TelegramConfig, TimeoutConfig};
pub use error::{Error, ErrorCategory, Result};
pub use listing::{build_digest, Digest, RoleListing};
pub use mailbox::{MailSource, MessageBodies, MessageId};
pub use notifier::Notifier;
pub use runner::{run_digest, RunOutcome, RunSummary};
pub use state::StateStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _ = MailboxConfig::builder();
        let _ = TelegramConfig::builder();
        let _ = state::MemoryStateStore::new();
        let _ = build_digest("", "");
    }
}
