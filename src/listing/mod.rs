//! Extraction and reconciliation of casting-call listings.
//!
//! A breakdown email carries the same projects twice: the plain-text body lists titles, apply
//! URLs and role names, while the HTML body carries a one-line caption per project (type,
//! union status, location). Both are keyed by the numeric `breakdown=` parameter of the apply
//! URL. This module recovers both, joins them and renders one message per project.
//!
//! Everything here is pure and infallible: garbage in yields an empty [`Digest`], never an error.
//!
//! ```
//! use casting_digest::listing::build_digest;
//!
//! let plain = "\
//! THE LONG WEEKEND
//!
//! https://actorsaccess.com/projects/?view=3Dbreakdowns&breakdown=3D812345
//!
//!   MAYA
//!   DEV
//! ";
//! let html = r#"<div><a href="https://actorsaccess.com/projects/?breakdown=812345">x</a></div>
//!   <div>Short NON-UNION Los Angeles, CA</div>"#;
//!
//! let digest = build_digest(plain, html);
//! assert_eq!(
//!     digest.messages,
//!     ["THE LONG WEEKEND\nShort | Non-Union | LA\nMAYA (and others)\n\
//!       Apply: https://actorsaccess.com/projects/?view=breakdowns&breakdown=812345"]
//! );
//! ```

pub mod format;
pub mod html;
pub mod normalize;
pub mod patterns;
pub mod plain;
pub mod reconcile;

use std::collections::HashMap;
use tracing::debug;

pub use reconcile::{deliver, reconcile, GroupKey, ProjectGroup};

/// One role within one project, as found in the plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleListing {
    /// Project heading.
    pub title: String,
    /// Role name.
    pub role: String,
    /// Application URL.
    pub apply_url: String,
    /// Digits of the `breakdown=` parameter, or empty.
    pub breakdown_id: String,
}

/// A project's caption as found in the HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Digits of the `breakdown=` parameter.
    pub breakdown_id: String,
    /// Single-line caption containing a union-status token.
    pub meta_text: String,
}

/// Captions keyed by breakdown id.
pub type MetadataMap = HashMap<String, String>;

/// Result of reconciling one email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    /// One rendered message per project, in first-encounter order.
    pub messages: Vec<String>,
    /// Listings dropped as vertical short form.
    pub skipped_excluded: usize,
    /// Listings parsed from the plain-text body.
    pub parsed_roles: usize,
}

/// Runs the full pipeline over the two bodies of one email.
#[must_use]
pub fn build_digest(text_plain: &str, html: &str) -> Digest {
    let listings = plain::parse_listings(&normalize::normalize(text_plain));
    let metadata = html::extract_metadata(html);

    debug!(
        listings = listings.len(),
        captions = metadata.len(),
        "Extracted listings and captions"
    );

    reconcile(&listings, &metadata)
}
