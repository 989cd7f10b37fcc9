//! One digest run: check, fetch, extract, deliver, record.

use crate::error::Result;
use crate::listing::{build_digest, deliver};
use crate::mailbox::MailSource;
use crate::notifier::Notifier;
use crate::state::StateStore;
use tracing::{info, instrument};

/// Counters and identity of a processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Id of the processed message.
    pub message_id: String,
    /// Subject of the processed message.
    pub subject: String,
    /// Rendered project messages.
    pub groups: usize,
    /// Messages the notifier accepted.
    pub sent: usize,
    /// Listings skipped as vertical short form.
    pub skipped_excluded: usize,
    /// Listings parsed from the plain-text body.
    pub parsed_roles: usize,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The label is empty.
    NoMessages,
    /// The latest message was handled by an earlier run.
    AlreadyProcessed {
        /// Id of the latest message.
        message_id: String,
    },
    /// The latest message was digested and recorded.
    Processed(RunSummary),
}

/// Digests the latest message of `source` unless `state` says it was already handled.
///
/// The message id is recorded after delivery, whether or not every delivery succeeded.
///
/// # Errors
///
/// Returns an error if the source or the state store fails. Delivery failures are not errors;
/// they only lower [`RunSummary::sent`].
#[instrument(name = "runner::run_digest", skip_all, fields(notifier = %notifier.description()))]
pub async fn run_digest(
    source: &mut dyn MailSource,
    state: &dyn StateStore,
    notifier: &dyn Notifier,
) -> Result<RunOutcome> {
    let Some(id) = source.latest_message_id().await? else {
        info!("No messages in label");
        return Ok(RunOutcome::NoMessages);
    };
    let message_id = id.to_string();

    if state.last_processed()?.as_deref() == Some(message_id.as_str()) {
        info!(message_id = %message_id, "Already processed");
        return Ok(RunOutcome::AlreadyProcessed { message_id });
    }

    let bodies = source.fetch_message(&id).await?;
    let digest = build_digest(&bodies.text_plain, &bodies.html);
    let sent = deliver(&digest, notifier).await;

    state.record_processed(&message_id)?;

    info!(
        message_id = %message_id,
        subject = %bodies.subject,
        sent_projects = sent,
        skipped_vertical_projects = digest.skipped_excluded,
        parsed_roles = digest.parsed_roles,
        "Done"
    );

    Ok(RunOutcome::Processed(RunSummary {
        message_id,
        subject: bodies.subject,
        groups: digest.messages.len(),
        sent,
        skipped_excluded: digest.skipped_excluded,
        parsed_roles: digest.parsed_roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mailbox::{MessageBodies, MessageId};
    use crate::state::MemoryStateStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedSource {
        latest: Option<MessageId>,
        bodies: MessageBodies,
        fetches: usize,
    }

    #[async_trait]
    impl MailSource for FixedSource {
        async fn latest_message_id(&mut self) -> Result<Option<MessageId>> {
            Ok(self.latest.clone())
        }

        async fn fetch_message(&mut self, _id: &MessageId) -> Result<MessageBodies> {
            self.fetches += 1;
            Ok(self.bodies.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<String>>,
        accept: bool,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send(&self, message: &str) -> bool {
            self.messages.lock().unwrap().push(message.to_string());
            self.accept
        }

        fn description(&self) -> &str {
            "recorder"
        }
    }

    fn source() -> FixedSource {
        FixedSource {
            latest: Some(MessageId::Imap {
                uid_validity: 3,
                uid: 99,
            }),
            bodies: MessageBodies {
                subject: "Breakdowns".into(),
                text_plain:
                    "FILM\n\nhttps://actorsaccess.com/projects/?breakdown=1\n  LEAD\n  EXTRA\n"
                        .into(),
                html: String::new(),
            },
            fetches: 0,
        }
    }

    #[tokio::test]
    async fn test_empty_label() {
        let mut source = FixedSource {
            latest: None,
            ..source()
        };
        let state = MemoryStateStore::new();
        let notifier = Recorder::default();

        let outcome = run_digest(&mut source, &state, &notifier).await.unwrap();

        assert_eq!(outcome, RunOutcome::NoMessages);
        assert_eq!(source.fetches, 0);
        assert_eq!(state.last_processed().unwrap(), None);
    }

    #[tokio::test]
    async fn test_already_processed_skips_fetch() {
        let mut source = source();
        let state = MemoryStateStore::with_last("3:99");
        let notifier = Recorder::default();

        let outcome = run_digest(&mut source, &state, &notifier).await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::AlreadyProcessed {
                message_id: "3:99".into()
            }
        );
        assert_eq!(source.fetches, 0);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_processes_and_records_even_when_delivery_fails() {
        let mut source = source();
        let state = MemoryStateStore::with_last("3:98");
        let notifier = Recorder {
            accept: false,
            ..Recorder::default()
        };

        let outcome = run_digest(&mut source, &state, &notifier).await.unwrap();

        let RunOutcome::Processed(summary) = outcome else {
            panic!("expected a processed run, got {outcome:?}");
        };
        assert_eq!(summary.message_id, "3:99");
        assert_eq!(summary.subject, "Breakdowns");
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.parsed_roles, 2);
        assert_eq!(state.last_processed().unwrap().as_deref(), Some("3:99"));
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            ["FILM\nLEAD (and others)\nApply: https://actorsaccess.com/projects/?breakdown=1"]
        );
    }

    struct BrokenSource;

    #[async_trait]
    impl MailSource for BrokenSource {
        async fn latest_message_id(&mut self) -> Result<Option<MessageId>> {
            Err(Error::LabelNotFound {
                label: "Missing".into(),
            })
        }

        async fn fetch_message(&mut self, id: &MessageId) -> Result<MessageBodies> {
            Err(Error::MessageNotFound { id: id.to_string() })
        }
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let state = MemoryStateStore::new();
        let result = run_digest(&mut BrokenSource, &state, &Recorder::default()).await;

        assert!(matches!(result, Err(Error::LabelNotFound { .. })));
        assert_eq!(state.last_processed().unwrap(), None);
    }
}
