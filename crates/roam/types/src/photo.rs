//! Shared trip photos.
//!
//! A photo may reference an itinerary item. The reference is weak:
//! deleting the item leaves the photo in place, and lookups treat the
//! stale id as unlinked.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItineraryItemId, UserId};

/// Unique identifier for a photo
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(pub String);

impl PhotoId {
    /// Generate a new random PhotoId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a PhotoId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A photo shared into a trip
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Opaque media reference produced by the blob store
    pub url: String,
    pub owner: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub taken_at: DateTime<Utc>,
    /// Members tagged in this photo; only the owner edits this set
    pub tagged: BTreeSet<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary_item_id: Option<ItineraryItemId>,
}

impl Photo {
    pub fn new(owner: UserId, url: impl Into<String>) -> Self {
        Self {
            id: PhotoId::generate(),
            url: url.into(),
            owner,
            caption: None,
            location: None,
            taken_at: Utc::now(),
            tagged: BTreeSet::new(),
            itinerary_item_id: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_linked_item(mut self, item_id: ItineraryItemId) -> Self {
        self.itinerary_item_id = Some(item_id);
        self
    }

    pub fn is_linked(&self) -> bool {
        self.itinerary_item_id.is_some()
    }

    pub fn is_tagged(&self, member: &UserId) -> bool {
        self.tagged.contains(member)
    }
}
