//! Sources of the message to digest.
//!
//! A digest run only ever looks at the most recent message of one label. [`MailSource`]
//! abstracts where that message comes from: [`LabelMailbox`] reads it over IMAP (Gmail exposes
//! labels as IMAP folders), [`EmlFile`] reads a saved message from disk.
//!
//! # Example
//!
//! ```no_run
//! use casting_digest::mailbox::{LabelMailbox, MailSource};
//! use casting_digest::MailboxConfig;
//!
//! # async fn example() -> casting_digest::Result<()> {
//! let config = MailboxConfig::builder()
//!     .email("user@gmail.com")
//!     .password("app-password")
//!     .label("Breakdowns")
//!     .build()?;
//!
//! let mut mailbox = LabelMailbox::connect(config).await?;
//! if let Some(id) = mailbox.latest_message_id().await? {
//!     let bodies = mailbox.fetch_message(&id).await?;
//!     println!("{id}: {}", bodies.subject);
//! }
//! mailbox.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::MailboxConfig;
use crate::connection;
use crate::error::{Error, Result};
use crate::parser;
use crate::session::{self, ImapSession};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Identifies a message across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// An IMAP message, stable while the mailbox keeps its UIDVALIDITY.
    Imap {
        /// UIDVALIDITY of the mailbox.
        uid_validity: u32,
        /// UID of the message.
        uid: u32,
    },
    /// A message read from a local file.
    File(PathBuf),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Imap { uid_validity, uid } => write!(f, "{uid_validity}:{uid}"),
            MessageId::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// The parts of a message the digest needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBodies {
    /// `Subject` header, or `(no subject)`.
    pub subject: String,
    /// All `text/plain` parts, joined and trimmed.
    pub text_plain: String,
    /// All `text/html` parts, joined and trimmed.
    pub html: String,
}

/// Where the latest message comes from.
#[async_trait]
pub trait MailSource: Send {
    /// Returns the id of the most recent message, or `None` if there are no messages.
    async fn latest_message_id(&mut self) -> Result<Option<MessageId>>;

    /// Fetches and parses the message with the given id.
    async fn fetch_message(&mut self, id: &MessageId) -> Result<MessageBodies>;

    /// Releases the source. The default does nothing.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads the latest message of a label over IMAP.
///
/// Create using [`LabelMailbox::connect`].
pub struct LabelMailbox {
    session: Box<ImapSession>,
    config: MailboxConfig,
    uid_validity: u32,
}

impl LabelMailbox {
    /// Connects, authenticates and opens the configured label.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Connection cannot be established
    /// - Authentication fails
    /// - The label does not exist ([`Error::LabelNotFound`])
    #[instrument(
        name = "LabelMailbox::connect",
        skip_all,
        fields(
            email = %config.email(),
            imap_host = %config.effective_imap_host(),
            label = %config.label
        )
    )]
    pub async fn connect(config: MailboxConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.server_address();
        let timeouts = &config.timeouts;

        let tls_stream = tokio::time::timeout(
            timeouts.connect,
            connection::establish_tls_connection(&imap_host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let mut session = tokio::time::timeout(
            timeouts.auth,
            session::authenticate(tls_stream, config.email(), config.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: config.email().to_string(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        let uid_validity = tokio::time::timeout(
            timeouts.select,
            session::select_label(&mut session, &config.label),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            label: config.label.clone(),
            timeout: timeouts.select,
        })??;

        Ok(Self {
            session: Box::new(session),
            config,
            uid_validity,
        })
    }

    /// Returns the label this mailbox reads.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.config.label
    }
}

#[async_trait]
impl MailSource for LabelMailbox {
    #[instrument(name = "LabelMailbox::latest_message_id", skip(self))]
    async fn latest_message_id(&mut self) -> Result<Option<MessageId>> {
        let timeout = self.config.timeouts.search;

        let uid = tokio::time::timeout(timeout, session::latest_uid(&mut self.session))
            .await
            .map_err(|_| Error::SearchTimeout { timeout })??;

        Ok(uid.map(|uid| MessageId::Imap {
            uid_validity: self.uid_validity,
            uid,
        }))
    }

    #[instrument(name = "LabelMailbox::fetch_message", skip(self), fields(message_id = %id))]
    async fn fetch_message(&mut self, id: &MessageId) -> Result<MessageBodies> {
        let MessageId::Imap { uid, .. } = id else {
            return Err(Error::MessageNotFound { id: id.to_string() });
        };
        let uid = *uid;
        let timeout = self.config.timeouts.fetch;

        let raw = tokio::time::timeout(timeout, session::fetch_raw(&mut self.session, uid))
            .await
            .map_err(|_| Error::FetchTimeout { uid, timeout })??
            .ok_or_else(|| Error::MessageNotFound { id: id.to_string() })?;

        parser::extract_bodies(&raw)
    }

    #[instrument(name = "LabelMailbox::close", skip(self))]
    async fn close(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.logout;

        tokio::time::timeout(timeout, session::logout(&mut self.session))
            .await
            .map_err(|_| Error::LogoutTimeout { timeout })?
    }
}

impl fmt::Debug for LabelMailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelMailbox")
            .field("email", &self.config.email())
            .field("label", &self.config.label)
            .field("uid_validity", &self.uid_validity)
            .finish_non_exhaustive()
    }
}

/// A single saved message (`.eml`), always reported as the latest.
#[derive(Debug, Clone)]
pub struct EmlFile {
    path: PathBuf,
}

impl EmlFile {
    /// Creates a source for the message stored at `path`. The file is read on fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MailSource for EmlFile {
    async fn latest_message_id(&mut self) -> Result<Option<MessageId>> {
        Ok(Some(MessageId::File(self.path.clone())))
    }

    #[instrument(name = "EmlFile::fetch_message", skip(self), fields(message_id = %id))]
    async fn fetch_message(&mut self, id: &MessageId) -> Result<MessageBodies> {
        if *id != MessageId::File(self.path.clone()) {
            return Err(Error::MessageNotFound { id: id.to_string() });
        }

        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| Error::ReadEml {
                path: self.path.clone(),
                source,
            })?;

        parser::extract_bodies(&raw)
    }
}
