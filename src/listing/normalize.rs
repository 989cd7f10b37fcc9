//! Undo the transport encodings that survive into listing bodies.

use htmlize::unescape;

/// Removes quoted-printable soft line breaks, restores `=3D` and decodes HTML entities.
///
/// Entities are expanded as an HTML5 parser would in text: legacy names such as `&amp` and
/// `&nbsp` decode without a trailing `;`, and invalid code points become U+FFFD.
///
/// Empty input yields an empty string.
///
/// ```
/// use casting_digest::listing::normalize::normalize;
///
/// assert_eq!(normalize("?view=3Dbd&amp;breakdown=3D12=\r\n34"), "?view=bd&breakdown=1234");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let unwrapped = raw
        .replace("=\r\n", "")
        .replace("=\n", "")
        .replace("=3D", "=");

    unescape(unwrapped).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_soft_line_breaks_join_lines() {
        assert_eq!(
            normalize("https://actorsaccess.com/pro=\njects/"),
            "https://actorsaccess.com/projects/"
        );
        assert_eq!(normalize("abc=\r\ndef\nghi"), "abcdef\nghi");
    }

    #[test]
    fn test_escaped_equals_restored() {
        assert_eq!(normalize("breakdown=3D812345"), "breakdown=812345");
    }

    #[test]
    fn test_named_and_numeric_entities() {
        assert_eq!(
            normalize("Tom &amp; Jerry&#39;s &quot;Pilot&quot;"),
            "Tom & Jerry's \"Pilot\""
        );
        assert_eq!(normalize("a&nbsp;b"), "a\u{a0}b");
        assert_eq!(normalize("&#x41;&lt;div&gt;"), "A<div>");
    }

    #[test]
    fn test_legacy_entities_without_semicolon() {
        assert_eq!(normalize("AT&amp T"), "AT& T");
        assert_eq!(normalize("&nbsp"), "\u{a0}");
        assert_eq!(normalize("&#39"), "'");
        assert_eq!(
            normalize("?view=breakdowns&ampbreakdown=7"),
            "?view=breakdowns&breakdown=7"
        );
    }

    #[test]
    fn test_invalid_code_points_are_replaced() {
        assert_eq!(normalize("&#0;"), "\u{fffd}");
        assert_eq!(normalize("&rsquo;&#x1F600;"), "\u{2019}\u{1F600}");
    }

    #[test]
    fn test_unknown_names_are_left_alone() {
        assert_eq!(normalize("&breakdown=1&view=x"), "&breakdown=1&view=x");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "SHORT FILM\n\n  LEAD (female)\n";
        assert_eq!(normalize(text), text);
    }
}
