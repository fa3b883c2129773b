//! Feed post as received from the ingestion pipeline and as stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A feed item to be persisted.
///
/// Produced by the feed parser and never mutated here. `guid` is the only
/// field with a uniqueness guarantee; it is the conflict target of every
/// write. The remaining fields are stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Item title.
    #[serde(default)]
    pub title: String,
    /// Author (`dc:creator`).
    #[serde(default)]
    pub creator: String,
    /// Item description or summary.
    #[serde(default)]
    pub description: String,
    /// Link to the original item.
    #[serde(default)]
    pub link: String,
    /// Publication date exactly as found in the feed.
    #[serde(default)]
    pub pub_date: String,
    /// Globally unique item identifier.
    pub guid: String,
    /// The feed's `isPermaLink` attribute, kept as text.
    #[serde(default)]
    pub guid_is_perma_link: String,
    /// Name of the feed the item came from.
    #[serde(default)]
    pub source: String,
    /// URL of the feed the item came from.
    #[serde(default)]
    pub source_url: String,
}

impl Post {
    /// Creates a post with only `guid` and `title` set.
    #[must_use]
    pub fn new(guid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if the post carries a usable `guid`.
    #[must_use]
    pub fn has_guid(&self) -> bool {
        !self.guid.trim().is_empty()
    }
}

/// A post row as held by a backend: the post plus server-assigned columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedPost {
    /// Auto-increment row ID.
    pub id: i64,
    /// Stored post fields.
    #[serde(flatten)]
    pub post: Post,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}
