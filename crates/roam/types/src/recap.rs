//! Recap value types.
//!
//! These records are built once a trip ends, from validated
//! collaborator output and frozen trip data. None of them refer back
//! into live trip state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ItineraryKind;

/// A playful award handed to one member at recap time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub title: String,
    pub winner_name: String,
    pub reason: String,
    /// Single emoji or short glyph shown next to the title
    pub icon: String,
}

/// One stop on the recap route map, in travel order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Location when the item has one, title otherwise
    pub label: String,
    pub kind: ItineraryKind,
    pub starts_at: NaiveDateTime,
}

/// Photo memory game round: spot what changed in the altered image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryChallenge {
    /// Base64 payload of the untouched photo
    pub original_image: String,
    /// Base64 payload of the edited photo
    pub altered_image: String,
    /// What the edit did, used to build the quiz
    pub diff_description: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}
