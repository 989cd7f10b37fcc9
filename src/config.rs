//! Configuration for the mailbox, delivery and state collaborators.
//!
//! Each collaborator has its own typed config built with a builder, so the binary can load
//! only what a given mode needs (a `--dry-run` needs no Telegram settings, an `--eml` run no
//! IMAP settings):
//!
//! ```
//! use casting_digest::MailboxConfig;
//!
//! let config = MailboxConfig::builder()
//!     .email("user@gmail.com")
//!     .password("app-password")
//!     .label("Breakdowns")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.effective_imap_host(), "imap.gmail.com");
//! ```
//!
//! The `from_env` constructors read the variables listed on each type; a missing required
//! variable is reported as [`Error::MissingEnv`].

use crate::error::{Error, Result};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the last-processed message id.
pub const DEFAULT_STATE_FILE: &str = "state.txt";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Configuration for reading the latest message of a label over IMAP.
///
/// Create using [`MailboxConfig::builder()`] or [`MailboxConfig::from_env()`].
///
/// Note: The `password` field is stored as a [`SecretString`] to prevent
/// accidental logging of sensitive credentials.
#[derive(Clone)]
pub struct MailboxConfig {
    email: EmailAddress,
    password: SecretString,
    /// IMAP server hostname (derived from the email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Label to read, selected as an IMAP mailbox.
    pub label: String,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

impl std::fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("label", &self.label)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl MailboxConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailboxConfigBuilder {
        MailboxConfigBuilder::default()
    }

    /// Loads the configuration from the environment.
    ///
    /// Reads `DIGEST_IMAP_EMAIL`, `DIGEST_IMAP_PASSWORD`, `LABEL_NAME`, and optionally
    /// `DIGEST_IMAP_HOST` and `DIGEST_IMAP_PORT`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] for an unset required variable, or a validation error
    /// from [`MailboxConfigBuilder::build`].
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder()
            .email(required_env("DIGEST_IMAP_EMAIL")?)
            .password(required_env("DIGEST_IMAP_PASSWORD")?)
            .label(required_env("LABEL_NAME")?);

        if let Some(host) = optional_env("DIGEST_IMAP_HOST") {
            builder = builder.imap_host(host);
        }
        if let Some(port) = optional_env("DIGEST_IMAP_PORT") {
            let port = port.parse().map_err(|_| Error::InvalidConfig {
                message: format!("DIGEST_IMAP_PORT is not a valid port: {port}"),
            })?;
            builder = builder.imap_port(port);
        }

        builder.build()
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password as a string slice.
    ///
    /// The password is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the IMAP host, either explicitly configured or `imap.<domain>`.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        match &self.imap_host {
            Some(host) => host.clone(),
            None => format!("imap.{}", self.email.domain().to_lowercase()),
        }
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Timeout configuration for IMAP operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting the label.
    pub select: Duration,
    /// Timeout for searching UIDs.
    pub search: Duration,
    /// Timeout for fetching message content.
    pub fetch: Duration,
    /// Timeout for logout operation.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Builder for [`MailboxConfig`].
#[derive(Debug, Default)]
pub struct MailboxConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    label: Option<String>,
    timeouts: Option<TimeoutConfig>,
}

impl MailboxConfigBuilder {
    /// Sets the email address (required).
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password (required). For Gmail, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the label to read (required).
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the IMAP server hostname explicitly.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993.
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, the label is blank, or the email
    /// address is malformed.
    pub fn build(self) -> Result<MailboxConfig> {
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;
        let email = validate_email(&email_raw)?;

        let password_raw = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        let label = self
            .label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .ok_or_else(|| Error::InvalidConfig {
                message: "label is required".into(),
            })?;

        Ok(MailboxConfig {
            email,
            password: SecretString::from(password_raw),
            imap_host: self.imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            label,
            timeouts: self.timeouts.unwrap_or_default(),
        })
    }
}

/// Configuration for delivering messages to a Telegram chat.
#[derive(Clone)]
pub struct TelegramConfig {
    bot_token: SecretString,
    /// Target chat id (numeric id or `@channel` name).
    pub chat_id: String,
    /// Bot API base URL. Overridable for testing.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TelegramConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelegramConfigBuilder {
        TelegramConfigBuilder::default()
    }

    /// Loads the configuration from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] if either variable is unset.
    pub fn from_env() -> Result<Self> {
        Self::builder()
            .bot_token(required_env("TELEGRAM_BOT_TOKEN")?)
            .chat_id(required_env("TELEGRAM_CHAT_ID")?)
            .build()
    }

    /// Returns the bot token.
    #[must_use]
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }
}

/// Builder for [`TelegramConfig`].
#[derive(Debug, Default)]
pub struct TelegramConfigBuilder {
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_base: Option<String>,
    timeout: Option<Duration>,
}

impl TelegramConfigBuilder {
    /// Sets the bot token (required).
    #[must_use]
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Sets the target chat (required).
    #[must_use]
    pub fn chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Overrides the Bot API base URL.
    #[must_use]
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Sets the per-request timeout. Default is 15 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or chat id is missing or blank.
    pub fn build(self) -> Result<TelegramConfig> {
        let bot_token = self
            .bot_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig {
                message: "bot token is required".into(),
            })?;
        let chat_id = self
            .chat_id
            .filter(|chat| !chat.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig {
                message: "chat id is required".into(),
            })?;

        Ok(TelegramConfig {
            bot_token: SecretString::from(bot_token),
            chat_id,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API.to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(15)),
        })
    }
}

/// Returns the state file path from `DIGEST_STATE_FILE`, or [`DEFAULT_STATE_FILE`].
#[must_use]
pub fn state_file_from_env() -> PathBuf {
    optional_env("DIGEST_STATE_FILE")
        .map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from)
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

fn required_env(name: &'static str) -> Result<String> {
    optional_env(name).ok_or(Error::MissingEnv { name })
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
