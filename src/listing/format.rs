//! Display formatting for metadata lines and outbound project messages.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a rendered message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 3500;

/// Appended to the role line when a project lists more than one role.
pub const MORE_ROLES_SUFFIX: &str = " (and others)";

/// Prefix of the application link line.
pub const APPLY_LABEL: &str = "Apply: ";

static META_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s+(NON-UNION|SAG-AFTRA|UNION)\s+(.*)$").expect("valid regex")
});

static LOS_ANGELES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLos\s+Angeles\b|\bLA\b").expect("valid regex")
});

/// Formats `"<type> <union> <location>"` as `"<type> | <union> | <location>"`.
///
/// Input not of that shape is returned trimmed.
///
/// ```
/// use casting_digest::listing::format::format_metadata;
///
/// assert_eq!(format_metadata("Short NON-UNION Los Angeles, CA"), "Short | Non-Union | LA");
/// assert_eq!(format_metadata("  no union status here "), "no union status here");
/// ```
#[must_use]
pub fn format_metadata(meta: &str) -> String {
    let meta = meta.trim();
    let Some(caps) = META_SHAPE.captures(meta) else {
        return meta.to_string();
    };

    let project_type = caps.get(1).map_or("", |m| m.as_str().trim());
    let union_raw = caps.get(2).map_or("", |m| m.as_str()).to_uppercase();
    let location = normalize_location(caps.get(3).map_or("", |m| m.as_str()));

    let union = match union_raw.as_str() {
        "SAG-AFTRA" => "SAG-AFTRA",
        "NON-UNION" => "Non-Union",
        _ => "Union",
    };

    format!("{project_type} | {union} | {location}")
}

/// Collapses any Los Angeles location to `LA`; other locations are returned trimmed.
#[must_use]
pub fn normalize_location(location: &str) -> String {
    let location = location.trim();
    if LOS_ANGELES.is_match(location) {
        "LA".to_string()
    } else {
        location.to_string()
    }
}

/// Renders one project message.
///
/// Segments are the title, the formatted metadata, the role line and the apply line; empty
/// segments are omitted. The result is cut to [`MAX_MESSAGE_CHARS`] characters.
#[must_use]
pub fn render_message(
    title: &str,
    meta: &str,
    first_role: &str,
    apply_url: &str,
    role_count: usize,
) -> String {
    let mut role_line = first_role.trim().to_string();
    if role_count > 1 {
        role_line.push_str(MORE_ROLES_SUFFIX);
    }

    let segments = [
        title.trim().to_string(),
        format_metadata(meta),
        role_line,
        format!("{APPLY_LABEL}{}", apply_url.trim()),
    ];

    let message = segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(message, MAX_MESSAGE_CHARS)
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_examples() {
        assert_eq!(
            format_metadata("Short NON-UNION Los Angeles, CA"),
            "Short | Non-Union | LA"
        );
        assert_eq!(
            format_metadata("Short SAG-AFTRA Los Angeles, CA, USA"),
            "Short | SAG-AFTRA | LA"
        );
    }

    #[test]
    fn test_format_plain_union_and_other_locations() {
        assert_eq!(
            format_metadata("Feature Film union Austin, TX"),
            "Feature Film | Union | Austin, TX"
        );
        assert_eq!(
            format_metadata("Pilot sag-aftra New York, NY"),
            "Pilot | SAG-AFTRA | New York, NY"
        );
    }

    #[test]
    fn test_format_non_matching_is_trimmed() {
        assert_eq!(format_metadata(""), "");
        assert_eq!(format_metadata("   "), "");
        assert_eq!(format_metadata("  Commercial Atlanta  "), "Commercial Atlanta");
        // Token needs text on both sides
        assert_eq!(format_metadata("NON-UNION Los Angeles"), "NON-UNION Los Angeles");
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("Los Angeles, CA"), "LA");
        assert_eq!(normalize_location("los   angeles"), "LA");
        assert_eq!(normalize_location("Greater LA Area"), "LA");
        assert_eq!(normalize_location(" Las Vegas, NV "), "Las Vegas, NV");
        assert_eq!(normalize_location("Atlanta"), "Atlanta");
    }

    #[test]
    fn test_render_single_role() {
        let message = render_message(
            " THE LONG WEEKEND ",
            "Short NON-UNION Los Angeles, CA",
            " MAYA ",
            " https://actorsaccess.com/projects/?breakdown=1 ",
            1,
        );
        assert_eq!(
            message,
            "THE LONG WEEKEND\nShort | Non-Union | LA\nMAYA\nApply: https://actorsaccess.com/projects/?breakdown=1"
        );
    }

    #[test]
    fn test_render_omits_empty_meta_and_marks_more_roles() {
        let message = render_message("TITLE", "", "LEAD", "https://a/?breakdown=2", 3);
        assert_eq!(message, "TITLE\nLEAD (and others)\nApply: https://a/?breakdown=2");
    }

    #[test]
    fn test_render_truncates_to_limit() {
        let title = "é".repeat(5000);
        let message = render_message(&title, "", "LEAD", "https://a/", 1);
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS);

        let short = render_message("T", "", "R", "u", 1);
        assert_eq!(short, "T\nR\nApply: u");
    }
}
