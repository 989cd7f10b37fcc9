//! Recovers role listings from the plain-text body of a breakdown email.
//!
//! The plain-text layout is a sequence of project blocks:
//!
//! ```text
//! PROJECT TITLE
//!
//! https://actorsaccess.com/projects/?view=breakdowns&breakdown=812345
//!
//!   ROLE NAME
//!   description lines, some of which also look like role names...
//!   ANOTHER ROLE
//! ```
//!
//! The scanner is a small state machine over lines: [`ScanState::SeekTitle`] finds the next
//! candidate heading, [`ScanState::SeekUrl`] confirms it by the following non-blank line, and
//! [`ScanState::CollectRoles`] gathers indented role-like lines until the next project begins.

use super::patterns::{extract_breakdown_id, is_apply_url};
use super::RoleListing;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Longest trimmed line still considered a role name.
pub const MAX_ROLE_LEN: usize = 70;

static AGE_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byears old\b").expect("valid regex"));

static ROLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-\(\) '\.]+$").expect("valid regex"));

/// Scanner state. Indices refer to lines of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the next non-blank line at or after `cursor`.
    SeekTitle {
        /// First line to inspect.
        cursor: usize,
    },
    /// A candidate title was found; the next non-blank line must be an apply URL.
    SeekUrl {
        /// Index of the candidate title line.
        title: usize,
    },
    /// Title and URL confirmed; role lines start at `cursor`.
    CollectRoles {
        /// Index of the title line.
        title: usize,
        /// Index of the apply URL line.
        url: usize,
        /// First line that may hold a role.
        cursor: usize,
    },
}

/// Parses the (already normalized) plain-text body into role listings in discovery order.
///
/// Segments that do not follow the block layout are skipped; the result may be empty.
///
/// ```
/// use casting_digest::listing::plain::parse_listings;
///
/// let body = "NIGHT SHIFT\n\nhttps://actorsaccess.com/projects/?breakdown=77\n\n  NURSE JO\n";
/// let listings = parse_listings(body);
/// assert_eq!(listings.len(), 1);
/// assert_eq!(listings[0].role, "NURSE JO");
/// assert_eq!(listings[0].breakdown_id, "77");
/// ```
#[must_use]
pub fn parse_listings(text: &str) -> Vec<RoleListing> {
    let lines = split_lines(text);

    let mut listings = Vec::new();
    let mut state = ScanState::SeekTitle { cursor: 0 };

    loop {
        state = match state {
            ScanState::SeekTitle { cursor } => match next_non_blank(&lines, cursor) {
                Some(title) => ScanState::SeekUrl { title },
                None => break,
            },
            ScanState::SeekUrl { title } => {
                // Nothing after the title: the rest cannot hold another project.
                let Some(url) = next_non_blank(&lines, title + 1) else {
                    break;
                };
                if is_apply_url(lines[url]) {
                    ScanState::CollectRoles {
                        title,
                        url,
                        cursor: url + 1,
                    }
                } else {
                    trace!(line = title, "Rejected title candidate");
                    ScanState::SeekTitle { cursor: title + 1 }
                }
            }
            ScanState::CollectRoles { title, url, cursor } => {
                let (roles, stop) = collect_roles(&lines, cursor);
                let title = lines[title].trim();
                let apply_url = lines[url].trim();
                let breakdown_id = extract_breakdown_id(apply_url);

                debug!(
                    title,
                    breakdown_id,
                    role_count = roles.len(),
                    "Parsed project block"
                );

                listings.extend(roles.into_iter().map(|role| RoleListing {
                    title: title.to_string(),
                    role: role.to_string(),
                    apply_url: apply_url.to_string(),
                    breakdown_id: breakdown_id.to_string(),
                }));

                ScanState::SeekTitle { cursor: stop }
            }
        };
    }

    listings
}

/// Returns `true` if a trimmed line plausibly names a role.
///
/// Rejects empty lines, lines over [`MAX_ROLE_LEN`] characters, lines containing `;`,
/// age descriptions ("years old"), and anything outside letters, digits, spaces and `-()'.`.
#[must_use]
pub fn looks_like_role(line: &str) -> bool {
    let s = line.trim();
    !s.is_empty()
        && !AGE_PHRASE.is_match(s)
        && !s.contains(';')
        && s.chars().count() <= MAX_ROLE_LEN
        && ROLE_CHARS.is_match(s)
}

/// Returns `true` if the line at `index` opens a new project block.
///
/// That is the case when the line is unindented and non-empty, and the next non-blank line
/// after it is an apply URL.
#[must_use]
pub fn starts_new_project(lines: &[&str], index: usize) -> bool {
    lines.get(index).is_some_and(|line| is_unindented(line))
        && next_non_blank(lines, index + 1).is_some_and(|next| is_apply_url(lines[next]))
}

/// Scans role lines from `start`; returns the accepted roles and the index where scanning stopped.
fn collect_roles<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    let mut roles = Vec::new();
    let mut cursor = start;

    while cursor < lines.len() {
        let line = lines[cursor];

        if is_unindented(line) {
            if starts_new_project(lines, cursor) {
                break;
            }
        } else if line.starts_with(' ') && looks_like_role(line) {
            roles.push(line.trim());
        }

        cursor += 1;
    }

    (roles, cursor)
}

/// Non-empty and not starting with a space. Tab-indented lines count as unindented.
fn is_unindented(line: &str) -> bool {
    !line.is_empty() && !line.starts_with(' ')
}

/// Splits on every line boundary: `\n`, `\r\n`, a lone `\r`, and the Unicode separators
/// (vertical tab, form feed, `\x1c`..`\x1e`, NEL, U+2028, U+2029).
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let end = match c {
            '\r' => match chars.peek() {
                Some((_, '\n')) => chars.next().map_or(index + 1, |(nl, _)| nl + 1),
                _ => index + 1,
            },
            '\n' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}' => index + c.len_utf8(),
            _ => continue,
        };
        lines.push(&text[start..index]);
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn next_non_blank(lines: &[&str], from: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL_A: &str =
        "https://actorsaccess.com/projects/?view=breakdowns&breakdown=812345&region=5";
    const URL_B: &str =
        "https://actorsaccess.com/projects/?view=breakdowns&breakdown=900001&region=5";

    #[test]
    fn test_no_url_yields_nothing() {
        assert!(parse_listings("").is_empty());
        assert!(parse_listings("Hello\n\n  WORLD\n  ANOTHER\n").is_empty());
        assert!(parse_listings("TITLE\n\nhttps://example.com/?breakdown=1\n  LEAD\n").is_empty());
    }

    #[test]
    fn test_single_block_one_listing_per_role() {
        let body = format!(
            "THE LONG WEEKEND\n\n{URL_A}\n\n  MAYA\n  Female, 20s. Sharp and funny.\n  DEV\n"
        );
        let listings = parse_listings(&body);

        // "Female, 20s. Sharp and funny." has a comma and is dropped by the heuristic
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].role, "MAYA");
        assert_eq!(listings[1].role, "DEV");
        for listing in &listings {
            assert_eq!(listing.title, "THE LONG WEEKEND");
            assert_eq!(listing.apply_url, URL_A);
            assert_eq!(listing.breakdown_id, "812345");
        }
    }

    #[test]
    fn test_two_blocks_split_at_next_title() {
        let body = format!(
            "FIRST\r\n\r\n{URL_A}\r\n  LEAD ONE\r\nSECOND\r\n\r\n{URL_B}\r\n\r\n  LEAD TWO\r\n"
        );
        let listings = parse_listings(&body);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "FIRST");
        assert_eq!(listings[0].role, "LEAD ONE");
        assert_eq!(listings[1].title, "SECOND");
        assert_eq!(listings[1].role, "LEAD TWO");
        assert_eq!(listings[1].breakdown_id, "900001");
    }

    #[test]
    fn test_unindented_noise_does_not_end_block() {
        let body = format!("TITLE\n{URL_A}\n  ROLE A\nSee notes below\n\n  ROLE B\n");
        let listings = parse_listings(&body);

        let roles: Vec<_> = listings.iter().map(|l| l.role.as_str()).collect();
        assert_eq!(roles, ["ROLE A", "ROLE B"]);
    }

    #[test]
    fn test_leading_preamble_is_skipped() {
        let body = format!("Your daily breakdowns\nfor Tuesday\n\nTITLE\n\n{URL_A}\n  LEAD\n");
        let listings = parse_listings(&body);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "TITLE");
    }

    #[test]
    fn test_block_without_roles_yields_nothing() {
        let body = format!("EMPTY ONE\n\n{URL_A}\n\nNEXT\n\n{URL_B}\n  SOLO\n");
        let listings = parse_listings(&body);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "NEXT");
    }

    #[test]
    fn test_title_at_end_of_document() {
        assert!(parse_listings("LONELY TITLE\n\n\n").is_empty());
    }

    #[test]
    fn test_tab_indented_lines_are_not_roles() {
        let body = format!("TITLE\n{URL_A}\n\tTABBED\n  SPACED\n");
        let listings = parse_listings(&body);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].role, "SPACED");
    }

    #[test]
    fn test_role_heuristic() {
        assert!(looks_like_role("  DR. O'NEILL (lead) - 2nd unit "));
        assert!(!looks_like_role(""));
        assert!(!looks_like_role("   "));
        assert!(!looks_like_role("LEAD; supporting"));
        assert!(!looks_like_role("About 30 years old"));
        assert!(!looks_like_role("ROLE: LEAD"));
        assert!(!looks_like_role("Female, 20s"));
        assert!(!looks_like_role(&"A".repeat(71)));
        assert!(looks_like_role(&"A".repeat(70)));
    }

    #[test]
    fn test_age_phrase_ignores_case_and_needs_word_boundaries() {
        assert!(!looks_like_role("Lead Years Old"));
        assert!(!looks_like_role("  MID-40S. YEARS OLD"));
        assert!(looks_like_role("YEARSOLD"));
        assert!(looks_like_role("TEN YEARS OLDER"));
    }

    #[test]
    fn test_lone_carriage_returns_split_lines() {
        let body = "FILM\r\rhttps://actorsaccess.com/projects/?breakdown=5\r  HOST\r";
        let listings = parse_listings(body);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "FILM");
        assert_eq!(listings[0].role, "HOST");
        assert_eq!(listings[0].breakdown_id, "5");
    }

    #[test]
    fn test_unicode_line_separators_split_lines() {
        let body = concat!(
            "FILM\u{2028}",
            "https://actorsaccess.com/projects/?breakdown=6\u{2029}",
            "  HOST\u{85}  GUEST",
        );
        let roles: Vec<_> = parse_listings(body).into_iter().map(|l| l.role).collect();
        assert_eq!(roles, ["HOST", "GUEST"]);
    }

    #[test]
    fn test_split_lines_matches_line_boundaries() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), ["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), ["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_starts_new_project_boundary() {
        let lines = ["  ROLE", "NEXT TITLE", "", URL_B, "Just a note", "", "  more"];

        assert!(starts_new_project(&lines, 1));
        assert!(!starts_new_project(&lines, 0)); // indented
        assert!(!starts_new_project(&lines, 2)); // empty
        assert!(!starts_new_project(&lines, 4)); // not followed by a URL
        assert!(!starts_new_project(&lines, 99));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let body = format!("A\n{URL_A}\n  X\n  Y\nB\n{URL_B}\n  Z\n");
        assert_eq!(parse_listings(&body), parse_listings(&body));
    }
}
