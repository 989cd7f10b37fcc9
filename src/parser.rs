//! Internal module for pulling the listing bodies out of a raw email.

use crate::error::{Error, Result};
use crate::mailbox::MessageBodies;
use mailparse::{parse_mail, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

/// Subject used when the message has none.
const NO_SUBJECT: &str = "(no subject)";

/// Parses a raw RFC 822 message and collects its subject, `text/plain` and `text/html` bodies.
///
/// Every leaf part of each type contributes, joined by newlines in document order. Transfer
/// encodings are decoded by `mailparse`; a leaf whose body cannot be decoded is skipped.
pub(crate) fn extract_bodies(raw: &[u8]) -> Result<MessageBodies> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;

    let subject = parsed
        .headers
        .get_first_value("Subject")
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    let mut plain_parts = Vec::new();
    let mut html_parts = Vec::new();
    collect_text_parts(&parsed, &mut plain_parts, &mut html_parts);

    debug!(
        subject = %subject,
        plain_parts = plain_parts.len(),
        html_parts = html_parts.len(),
        "Extracted message bodies"
    );

    Ok(MessageBodies {
        subject,
        text_plain: plain_parts.join("\n").trim().to_string(),
        html: html_parts.join("\n").trim().to_string(),
    })
}

/// Depth-first walk over leaf parts.
fn collect_text_parts(part: &ParsedMail<'_>, plain: &mut Vec<String>, html: &mut Vec<String>) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_text_parts(sub, plain, html);
        }
        return;
    }

    let target = match part.ctype.mimetype.to_lowercase().as_str() {
        "text/plain" => plain,
        "text/html" => html,
        _ => return,
    };

    match part.get_body() {
        Ok(body) => target.push(body),
        Err(e) => warn!(
            mimetype = %part.ctype.mimetype,
            error = %e,
            "Failed to decode message part, skipping"
        ),
    }
}
