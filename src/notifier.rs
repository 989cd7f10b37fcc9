//! Delivery of rendered project messages.
//!
//! Delivery is best effort: a [`Notifier`] reports each message as sent or not, and callers
//! carry on with the next one.
//!
//! # Example
//!
//! ```no_run
//! use casting_digest::config::TelegramConfig;
//! use casting_digest::notifier::{Notifier, TelegramNotifier};
//!
//! # async fn example() -> casting_digest::Result<()> {
//! let config = TelegramConfig::builder()
//!     .bot_token("123:abc")
//!     .chat_id("-1001234")
//!     .build()?;
//! let notifier = TelegramNotifier::new(config)?;
//! let delivered = notifier.send("THE LONG WEEKEND\nMAYA\nApply: https://...").await;
//! # Ok(())
//! # }
//! ```

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Longest slice of an error response body that is logged.
const MAX_LOGGED_BODY_CHARS: usize = 500;

/// Destination for rendered messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one message. Returns `true` if the destination accepted it.
    async fn send(&self, message: &str) -> bool;

    /// Returns a human-readable description of the destination, used in logs.
    fn description(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Posts messages to a Telegram chat through the Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
    endpoint: String,
}

impl TelegramNotifier {
    /// Builds a notifier whose HTTP client applies the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpClient`] if the HTTP client cannot be constructed.
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| Error::HttpClient { source })?;

        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            config.bot_token()
        );

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(
        name = "TelegramNotifier::send",
        skip_all,
        fields(chat_id = %self.config.chat_id, message_chars = message.chars().count())
    )]
    async fn send(&self, message: &str) -> bool {
        let payload = SendMessage {
            chat_id: &self.config.chat_id,
            text: message,
            disable_web_page_preview: true,
        };

        let response = match self.client.post(&self.endpoint).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                let timeout = e.is_timeout();
                // reqwest errors may embed the URL, which contains the bot token
                warn!(error = %e.without_url(), timeout, "Telegram delivery failed");
                return false;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Message delivered");
            return true;
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
        warn!(status = status.as_u16(), body = %body, "Telegram rejected message");
        false
    }

    fn description(&self) -> &str {
        "telegram"
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Prints messages to standard output instead of delivering them. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, message: &str) -> bool {
        println!("{message}\n");
        true
    }

    fn description(&self) -> &str {
        "stdout"
    }
}
