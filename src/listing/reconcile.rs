//! Joins plain-text listings with HTML metadata, filters and groups them per project.

use super::format::render_message;
use super::patterns::is_excluded_category;
use super::{Digest, MetadataMap, RoleListing};
use crate::notifier::Notifier;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Identity of a project group.
///
/// Listings without a breakdown id fall back to their trimmed title and URL. Two different
/// projects sharing both would be merged; this mirrors how the listing emails have always been
/// grouped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Keyed by breakdown id.
    Breakdown(String),
    /// Keyed by title and apply URL when no id is available.
    Fallback {
        /// Trimmed project title.
        title: String,
        /// Trimmed apply URL.
        apply_url: String,
    },
}

impl GroupKey {
    /// Computes the grouping key of a listing.
    #[must_use]
    pub fn of(listing: &RoleListing) -> Self {
        let id = listing.breakdown_id.trim();
        if id.is_empty() {
            GroupKey::Fallback {
                title: listing.title.trim().to_string(),
                apply_url: listing.apply_url.trim().to_string(),
            }
        } else {
            GroupKey::Breakdown(id.to_string())
        }
    }
}

/// One project and the roles collected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    /// Grouping key.
    pub key: GroupKey,
    /// Title of the first listing seen for this project.
    pub title: String,
    /// Caption from the HTML body; empty when none matched.
    pub meta_text: String,
    /// Apply URL of the first listing seen for this project.
    pub apply_url: String,
    /// Role names in encounter order.
    pub roles: Vec<String>,
}

impl ProjectGroup {
    /// Renders the message for this group, or `None` when no non-blank role remains.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        let roles: Vec<&str> = self
            .roles
            .iter()
            .map(String::as_str)
            .filter(|role| !role.trim().is_empty())
            .collect();

        let first = roles.first()?;
        Some(render_message(
            &self.title,
            &self.meta_text,
            first,
            &self.apply_url,
            roles.len(),
        ))
    }
}

/// Groups listings by project, dropping those whose metadata is in the excluded category.
///
/// Returns the groups in first-encounter order and the number of skipped listings.
#[must_use]
pub fn group_listings(
    listings: &[RoleListing],
    metadata: &MetadataMap,
) -> (Vec<ProjectGroup>, usize) {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut skipped = 0;

    for listing in listings {
        let meta = metadata
            .get(listing.breakdown_id.trim())
            .map_or("", String::as_str);

        if is_excluded_category(meta) {
            debug!(breakdown_id = %listing.breakdown_id, "Skipping vertical short form listing");
            skipped += 1;
            continue;
        }

        let key = GroupKey::of(listing);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(ProjectGroup {
                key,
                title: listing.title.clone(),
                meta_text: meta.to_string(),
                apply_url: listing.apply_url.clone(),
                roles: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].roles.push(listing.role.clone());
    }

    (groups, skipped)
}

/// Reconciles listings against metadata and renders one message per project.
///
/// Pure: the same inputs always produce the same [`Digest`].
#[must_use]
#[instrument(name = "reconcile::reconcile", skip_all, fields(listings = listings.len()))]
pub fn reconcile(listings: &[RoleListing], metadata: &MetadataMap) -> Digest {
    let (groups, skipped_excluded) = group_listings(listings, metadata);
    let messages: Vec<String> = groups.iter().filter_map(ProjectGroup::render).collect();

    debug!(
        groups = groups.len(),
        messages = messages.len(),
        skipped_excluded,
        "Reconciled listings"
    );

    Digest {
        messages,
        skipped_excluded,
        parsed_roles: listings.len(),
    }
}

/// Sends each message of the digest in order and returns how many were delivered.
///
/// A failed send does not stop the remaining ones.
#[instrument(
    name = "reconcile::deliver",
    skip_all,
    fields(notifier = %notifier.description(), messages = digest.messages.len())
)]
pub async fn deliver(digest: &Digest, notifier: &dyn Notifier) -> usize {
    let mut sent = 0;
    for message in &digest.messages {
        if notifier.send(message).await {
            sent += 1;
        }
    }
    sent
}
