//! Internal IMAP session management.
//!
//! This module wraps async-imap operations with proper error handling.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authenticates to IMAP server and returns a session.
#[instrument(name = "session::authenticate", skip_all, fields(email = %email))]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    email: &str,
    password: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(email, password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: email.to_string(),
            source: e.0,
        })
}

/// Opens the label's mailbox read-only (`EXAMINE`) and returns its UIDVALIDITY (0 if not reported).
///
/// A `NO` response means the server does not know the name.
#[instrument(name = "session::select_label", skip(session), fields(label = %label))]
pub(crate) async fn select_label(session: &mut ImapSession, label: &str) -> Result<u32> {
    debug!("Selecting label");

    let mailbox = session.examine(label).await.map_err(|source| match source {
        async_imap::error::Error::No(_) => Error::LabelNotFound {
            label: label.to_string(),
        },
        source => Error::SelectMailbox {
            label: label.to_string(),
            source,
        },
    })?;

    debug!(
        exists = mailbox.exists,
        uid_validity = mailbox.uid_validity,
        "Label selected"
    );

    Ok(mailbox.uid_validity.unwrap_or(0))
}

/// Returns the highest UID in the selected mailbox, or `None` if it is empty.
#[instrument(name = "session::latest_uid", skip(session))]
pub(crate) async fn latest_uid(session: &mut ImapSession) -> Result<Option<u32>> {
    let uids = session
        .uid_search("ALL")
        .await
        .map_err(|source| Error::ImapSearch { source })?;

    let max_uid = uids.iter().max().copied();

    debug!(?max_uid, uid_count = uids.len(), "Retrieved latest UID");

    Ok(max_uid)
}

/// Fetches the raw RFC 822 bytes of one message without setting `\Seen`.
///
/// Returns `None` if the server returned no body for the UID.
#[instrument(name = "session::fetch_raw", skip(session))]
pub(crate) async fn fetch_raw(session: &mut ImapSession, uid: u32) -> Result<Option<Vec<u8>>> {
    let mut stream = session
        .uid_fetch(uid.to_string(), "BODY.PEEK[]")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?
        .boxed();

    let mut raw = None;
    // Drain the whole stream so the session is ready for the next command
    while let Some(fetch) = stream.next().await {
        let fetch = fetch.map_err(|source| Error::FetchMessage { source })?;
        if raw.is_none() && fetch.uid.map_or(true, |fetched| fetched == uid) {
            raw = fetch.body().map(<[u8]>::to_vec);
        }
    }

    debug!(found = raw.is_some(), "Fetched message");

    Ok(raw)
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}
