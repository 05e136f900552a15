//! Itinerary item records.
//!
//! Items belong to exactly one trip and are kept sorted by start time
//! in the owning store. The kind decides how the timeline renders an
//! item: transport legs become connectors between stops.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{TripError, TripId, TripResult};

/// Unique identifier for an itinerary item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItineraryItemId(pub String);

impl ItineraryItemId {
    /// Generate a new random ItineraryItemId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create an ItineraryItemId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ItineraryItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of activity an itinerary item describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItineraryKind {
    Flight,
    Lodging,
    Food,
    Attraction,
    Transport,
    #[default]
    Other,
}

impl ItineraryKind {
    /// Transport legs render as connectors, not stops
    pub fn is_transport(&self) -> bool {
        matches!(self, ItineraryKind::Transport)
    }
}

impl std::fmt::Display for ItineraryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItineraryKind::Flight => "flight",
            ItineraryKind::Lodging => "lodging",
            ItineraryKind::Food => "food",
            ItineraryKind::Attraction => "attraction",
            ItineraryKind::Transport => "transport",
            ItineraryKind::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// A single scheduled activity within a trip
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: ItineraryItemId,
    /// Owning trip, fixed at creation
    pub trip_id: TripId,
    pub kind: ItineraryKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItineraryItem {
    /// Materialize a draft into a stored item for one trip
    pub fn new(trip_id: TripId, draft: ItineraryDraft) -> Self {
        Self {
            id: ItineraryItemId::generate(),
            trip_id,
            kind: draft.kind,
            title: draft.title,
            location: draft.location,
            start_time: draft.start_time,
            end_time: draft.end_time,
            notes: draft.notes,
        }
    }

    /// Replace the editable fields from a draft; id and trip binding
    /// never change
    pub fn apply(&mut self, draft: ItineraryDraft) {
        self.kind = draft.kind;
        self.title = draft.title;
        self.location = draft.location;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.notes = draft.notes;
    }

    pub fn is_transport(&self) -> bool {
        self.kind.is_transport()
    }
}

/// Fields for creating or editing an itinerary item
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItineraryDraft {
    pub kind: ItineraryKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItineraryDraft {
    pub fn new(kind: ItineraryKind, title: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            kind,
            title: title.into(),
            location: None,
            start_time,
            end_time: None,
            notes: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Transport prefill for filling a travel gap between two stops
    pub fn transport_between(
        title: impl Into<String>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Self {
        Self::new(ItineraryKind::Transport, title, from).with_end_time(to)
    }

    pub fn validate(&self) -> TripResult<()> {
        if self.title.trim().is_empty() {
            return Err(TripError::Validation("item title must not be empty".into()));
        }
        if let Some(end_time) = self.end_time {
            if end_time < self.start_time {
                return Err(TripError::Validation(format!(
                    "item ends before it starts ({} < {})",
                    end_time, self.start_time
                )));
            }
        }
        Ok(())
    }
}
