//! Extracts per-project metadata captions from the HTML body.
//!
//! The HTML template renders each project as an anchor to the apply URL inside a `<div>`,
//! immediately followed by a sibling `<div>` holding a caption such as
//! `Short Film | NON-UNION | Los Angeles, CA`. Matching is a bounded pattern search over the
//! raw markup rather than a DOM walk; markup that strays from that template is simply not
//! matched.

use super::normalize::normalize;
use super::patterns::has_union_token;
use super::{MetadataMap, ProjectMetadata};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static CAPTION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)breakdown=(\d+)[^"']*["'][^>]*>.*?</a>\s*</div>\s*<div[^>]*>\s*(.*?)\s*</div>"#,
    )
    .expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Returns every retained caption in document order, duplicates included.
///
/// Captions without a union-status token are dropped.
#[must_use]
pub fn extract_captions(html: &str) -> Vec<ProjectMetadata> {
    let html = normalize(html);

    CAPTION_BLOCK
        .captures_iter(&html)
        .filter_map(|caps| {
            let breakdown_id = caps.get(1)?.as_str();
            let meta_text = caption_text(caps.get(2).map_or("", |m| m.as_str()));

            if has_union_token(&meta_text) {
                Some(ProjectMetadata {
                    breakdown_id: breakdown_id.to_string(),
                    meta_text,
                })
            } else {
                debug!(breakdown_id, caption = %meta_text, "Dropped caption without union status");
                None
            }
        })
        .collect()
}

/// Maps each breakdown id to its caption. A later caption for the same id replaces an earlier one.
///
/// ```
/// use casting_digest::listing::html::extract_metadata;
///
/// let html = r#"<div><a href="https://actorsaccess.com/projects/?breakdown=42">Pilot</a></div>
/// <div><span>Pilot</span> SAG-AFTRA Atlanta, GA</div>"#;
/// let meta = extract_metadata(html);
/// assert_eq!(meta["42"], "Pilot SAG-AFTRA Atlanta, GA");
/// ```
#[must_use]
pub fn extract_metadata(html: &str) -> MetadataMap {
    extract_captions(html)
        .into_iter()
        .map(|entry| (entry.breakdown_id, entry.meta_text))
        .collect()
}

/// Strips markup and collapses whitespace, including non-breaking spaces.
fn caption_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let spaced = collapsed.trim().replace('\u{a0}', " ").replace("&nbsp;", " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, caption: &str) -> String {
        format!(
            "<div class=\"title\"><a href=\"https://actorsaccess.com/projects/?view=breakdowns&amp;breakdown={id}&amp;region=5\" target=\"_blank\"><b>PROJECT {id}</b></a></div>\n  <div class=\"meta\">{caption}</div>\n"
        )
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(extract_metadata("").is_empty());
        assert!(extract_metadata("<html><body>nothing here</body></html>").is_empty());
        assert!(extract_metadata("<<<>>> breakdown= </a></div>").is_empty());
    }

    #[test]
    fn test_caption_with_union_token_is_kept() {
        let html = block("812345", "Short Film&nbsp;NON-UNION <i>Los Angeles, CA</i>");
        let meta = extract_metadata(&html);

        assert_eq!(meta.len(), 1);
        assert_eq!(meta["812345"], "Short Film NON-UNION Los Angeles, CA");
    }

    #[test]
    fn test_caption_without_union_token_is_absent() {
        let html =
            block("1", "Commercial Los Angeles, CA") + &block("2", "Feature union Austin, TX");
        let meta = extract_metadata(&html);

        assert!(!meta.contains_key("1"));
        assert_eq!(meta["2"], "Feature union Austin, TX");
    }

    #[test]
    fn test_quoted_printable_markup_is_normalized() {
        let html = "<div><a href=3D\"https://actorsaccess.com/projects/?breakdo=\nwn=3D55\">X</a></div>\n<div>Pilot SAG-AFTRA New York, NY</div>";
        let meta = extract_metadata(html);

        assert_eq!(meta["55"], "Pilot SAG-AFTRA New York, NY");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let html = block("7", "Short NON-UNION Chicago") + &block("7", "Short SAG-AFTRA Chicago");
        let captions = extract_captions(&html);
        assert_eq!(captions.len(), 2);

        let meta = extract_metadata(&html);
        assert_eq!(meta["7"], "Short SAG-AFTRA Chicago");
    }

    #[test]
    fn test_multiline_caption_collapses() {
        let html = block(
            "9",
            "\n   Vertical Short Form\n   <br/>\n   NON-UNION\n   Los Angeles, CA\n",
        );
        let meta = extract_metadata(&html);

        assert_eq!(meta["9"], "Vertical Short Form NON-UNION Los Angeles, CA");
    }
}
