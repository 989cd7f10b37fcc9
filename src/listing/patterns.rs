//! Recognizers shared by the plain-text parser, the HTML extractor and the formatter.
//!
//! The listings host and path are fixed; everything keys off the `breakdown=<digits>`
//! query parameter that both body representations carry.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a trimmed line that starts with an application URL.
static APPLY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://actorsaccess\.com/projects/\?[^\s]*breakdown=\d+").expect("valid regex")
});

static BREAKDOWN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"breakdown=(\d+)").expect("valid regex"));

static UNION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(NON-UNION|SAG-AFTRA|UNION)\b").expect("valid regex")
});

/// Metadata containing this phrase (case-insensitive) marks a vertical short-form project.
pub const EXCLUDED_CATEGORY: &str = "vertical short form";

/// Returns `true` if `line`, once trimmed, begins with an application URL.
///
/// ```
/// use casting_digest::listing::patterns::is_apply_url;
///
/// assert!(is_apply_url("  https://actorsaccess.com/projects/?view=breakdowns&breakdown=812345"));
/// assert!(!is_apply_url("https://example.com/projects/?breakdown=812345"));
/// ```
#[must_use]
pub fn is_apply_url(line: &str) -> bool {
    APPLY_URL.is_match(line.trim())
}

/// Extracts the digits following `breakdown=` in `url`, or an empty string.
///
/// ```
/// use casting_digest::listing::patterns::extract_breakdown_id;
///
/// assert_eq!(extract_breakdown_id("https://x/?breakdown=42&r=1"), "42");
/// assert_eq!(extract_breakdown_id("https://x/?role=1"), "");
/// ```
#[must_use]
pub fn extract_breakdown_id(url: &str) -> &str {
    BREAKDOWN_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// Returns `true` if `text` mentions a union status as a whole word.
#[must_use]
pub fn has_union_token(text: &str) -> bool {
    UNION_TOKEN.is_match(text)
}

/// Returns `true` if `meta` belongs to the excluded vertical short-form category.
#[must_use]
pub fn is_excluded_category(meta: &str) -> bool {
    meta.to_lowercase().contains(EXCLUDED_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_url_requires_host_path_and_id() {
        assert!(is_apply_url(
            "https://actorsaccess.com/projects/?view=breakdowns&breakdown=812345&region=5"
        ));
        assert!(is_apply_url("http://actorsaccess.com/projects/?breakdown=1"));
        assert!(!is_apply_url("https://actorsaccess.com/projects/?breakdown="));
        assert!(!is_apply_url("https://actorsaccess.com/other/?breakdown=1"));
        assert!(!is_apply_url("Apply at https://actorsaccess.com/projects/?breakdown=1"));
    }

    #[test]
    fn test_extract_breakdown_id() {
        assert_eq!(
            extract_breakdown_id("https://actorsaccess.com/projects/?breakdown=812345&x=9"),
            "812345"
        );
        assert_eq!(extract_breakdown_id(""), "");
        assert_eq!(extract_breakdown_id("breakdown=abc"), "");
    }

    #[test]
    fn test_union_tokens_are_whole_words() {
        assert!(has_union_token("Short NON-UNION Los Angeles"));
        assert!(has_union_token("Feature sag-aftra Atlanta"));
        assert!(has_union_token("Pilot Union New York"));
        assert!(!has_union_token("Reunion special"));
        assert!(!has_union_token("Commercial Los Angeles"));
    }

    #[test]
    fn test_excluded_category_is_case_insensitive() {
        assert!(is_excluded_category("Vertical Short Form NON-UNION LA"));
        assert!(!is_excluded_category("Short Film NON-UNION LA"));
        assert!(!is_excluded_category(""));
    }
}
