//! Trip identity, membership, and engagement statistics.
//!
//! A [`Trip`] is the aggregate everything else hangs off: travel dates,
//! lifecycle status, the join code members share aloud, and the
//! per-member engagement counters that feed award generation once the
//! trip has ended.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{TripError, TripResult};

/// Unique identifier for a trip
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub String);

impl TripId {
    /// Generate a new random TripId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a TripId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Short display form (first 8 chars)
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trip member
///
/// Ordered so that member sets (votes, photo tags) have a stable
/// iteration order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new random UserId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a UserId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of one or more trips
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Avatar reference, seeded deterministically from the display name
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Create a user with a generated id and a seeded avatar
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let avatar = Self::avatar_for(&name);
        Self {
            id: UserId::generate(),
            name,
            avatar,
            email: None,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Deterministic avatar reference for a display name
    pub fn avatar_for(seed: &str) -> String {
        format!("https://api.dicebear.com/9.x/avataaars/svg?seed={seed}")
    }
}

/// Lifecycle status of a trip
///
/// Upcoming and Ongoing are both planning states. Ended is terminal
/// and entered only through the explicit end-trip command; the
/// Upcoming-to-Ongoing hop happens outside the core (calendar, owner
/// action) and arrives here as seeded data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TripStatus {
    #[default]
    Upcoming,
    Ongoing,
    Ended,
}

impl TripStatus {
    pub fn is_upcoming(&self) -> bool {
        matches!(self, TripStatus::Upcoming)
    }

    pub fn is_ongoing(&self) -> bool {
        matches!(self, TripStatus::Ongoing)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, TripStatus::Ended)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TripStatus::Upcoming => "upcoming",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Ended => "ended",
        };
        write!(f, "{label}")
    }
}

/// Member actions that count toward engagement statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatAction {
    OpenTrip,
    ViewItinerary,
    EditItinerary,
    AddPhoto,
    CastVote,
}

/// Per-member engagement counters for one trip
///
/// Counters start at zero when a member's first action lands and only
/// ever increase. They are read back verbatim at recap time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub trip_opens: u64,
    pub itinerary_views: u64,
    pub itinerary_edits: u64,
    pub photos_added: u64,
    pub votes_cast: u64,
}

impl UserStats {
    /// Bump the counter matching one action
    pub fn record(&mut self, action: StatAction) {
        let counter = match action {
            StatAction::OpenTrip => &mut self.trip_opens,
            StatAction::ViewItinerary => &mut self.itinerary_views,
            StatAction::EditItinerary => &mut self.itinerary_edits,
            StatAction::AddPhoto => &mut self.photos_added,
            StatAction::CastVote => &mut self.votes_cast,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Fields for creating a trip
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripDraft {
    pub name: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub created_by: User,
}

impl TripDraft {
    pub fn new(
        name: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: User,
    ) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            description: None,
            start_date,
            end_date,
            cover_image: None,
            created_by,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }

    pub fn validate(&self) -> TripResult<()> {
        if self.name.trim().is_empty() {
            return Err(TripError::Validation("trip name must not be empty".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(TripError::Validation(
                "trip destination must not be empty".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(TripError::Validation(format!(
                "trip ends before it starts ({} < {})",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// Detail fields an owner may edit after creation
///
/// Deliberately has no status field: edits can never move a trip
/// through its lifecycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripEdit {
    pub name: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cover_image: String,
}

impl TripEdit {
    /// Start an edit from a trip's current details
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            name: trip.name.clone(),
            destination: trip.destination.clone(),
            description: trip.description.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            cover_image: trip.cover_image.clone(),
        }
    }

    pub fn validate(&self) -> TripResult<()> {
        if self.name.trim().is_empty() {
            return Err(TripError::Validation("trip name must not be empty".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(TripError::Validation(
                "trip destination must not be empty".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(TripError::Validation(format!(
                "trip ends before it starts ({} < {})",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// A group trip
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TripStatus,
    pub cover_image: String,
    /// Six-character uppercase code members use to join
    pub join_code: String,
    pub members: Vec<User>,
    /// Engagement counters keyed by member, populated lazily
    pub stats: HashMap<UserId, UserStats>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Materialize a draft; new trips always start Upcoming
    pub fn new(draft: TripDraft, join_code: impl Into<String>) -> Self {
        let now = Utc::now();
        let cover_image = draft
            .cover_image
            .unwrap_or_else(|| Self::default_cover(&draft.destination));
        Self {
            id: TripId::generate(),
            name: draft.name,
            destination: draft.destination,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: TripStatus::Upcoming,
            cover_image,
            join_code: join_code.into(),
            members: vec![draft.created_by],
            stats: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: TripId) -> Self {
        self.id = id;
        self
    }

    /// Override the lifecycle status, for seeding trips that are
    /// already underway or finished
    pub fn with_status(mut self, status: TripStatus) -> Self {
        self.status = status;
        self
    }

    /// Stock cover keyed to the destination, used when the creator
    /// does not upload one
    pub fn default_cover(destination: &str) -> String {
        let query = destination.trim().replace(' ', "+");
        format!("https://source.unsplash.com/random/800x600/?{query}")
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|member| &member.id == user_id)
    }

    pub fn member(&self, user_id: &UserId) -> Option<&User> {
        self.members.iter().find(|member| &member.id == user_id)
    }

    /// Add a member; joining twice is a no-op
    pub fn add_member(&mut self, user: User) {
        if !self.is_member(&user.id) {
            self.members.push(user);
            self.updated_at = Utc::now();
        }
    }

    /// Apply an owner edit; lifecycle status is untouched
    pub fn apply_edit(&mut self, edit: TripEdit) {
        self.name = edit.name;
        self.destination = edit.destination;
        self.description = edit.description;
        self.start_date = edit.start_date;
        self.end_date = edit.end_date;
        self.cover_image = edit.cover_image;
        self.updated_at = Utc::now();
    }

    /// Count one member action, initializing counters on first touch
    pub fn record_action(&mut self, member: &UserId, action: StatAction) -> UserStats {
        let stats = self.stats.entry(member.clone()).or_default();
        stats.record(action);
        *stats
    }

    pub fn stats_for(&self, member: &UserId) -> Option<&UserStats> {
        self.stats.get(member)
    }

    /// One-way transition out of Ongoing; anything else is rejected
    pub fn end(&mut self) -> TripResult<()> {
        if !self.status.is_ongoing() {
            return Err(TripError::TripNotOngoing(self.status));
        }
        self.status = TripStatus::Ended;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TripDraft {
        TripDraft::new(
            "Tokyo Adventure",
            "Tokyo, Japan",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            User::new("Alice"),
        )
    }

    #[test]
    fn test_trip_id_generation() {
        let id = TripId::generate();
        assert!(!id.0.is_empty());
        assert_eq!(id.short().len(), 8);
        assert_ne!(TripId::generate(), TripId::generate());
    }

    #[test]
    fn test_user_avatar_is_seeded_by_name() {
        let user = User::new("Alice");
        assert!(user.avatar.contains("seed=Alice"));
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut blank = draft();
        blank.name = "   ".into();
        assert!(matches!(blank.validate(), Err(TripError::Validation(_))));

        let mut inverted = draft();
        inverted.end_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(matches!(inverted.validate(), Err(TripError::Validation(_))));
    }

    #[test]
    fn test_new_trip_starts_upcoming_with_creator_as_member() {
        let creator_id = UserId::new("alice");
        let mut d = draft();
        d.created_by = d.created_by.with_id(creator_id.clone());
        let trip = Trip::new(d, "ABC123");

        assert!(trip.status.is_upcoming());
        assert!(trip.is_member(&creator_id));
        assert_eq!(trip.join_code, "ABC123");
    }

    #[test]
    fn test_default_cover_uses_destination() {
        let trip = Trip::new(draft(), "ABC123");
        assert!(trip.cover_image.contains("Tokyo,+Japan"));
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut trip = Trip::new(draft(), "ABC123");
        let bob = User::new("Bob").with_id(UserId::new("bob"));
        trip.add_member(bob.clone());
        trip.add_member(bob);
        assert_eq!(trip.members.len(), 2);
    }

    #[test]
    fn test_apply_edit_never_touches_status() {
        let mut trip = Trip::new(draft(), "ABC123").with_status(TripStatus::Ongoing);
        let mut edit = TripEdit::from_trip(&trip);
        edit.name = "Renamed".into();
        trip.apply_edit(edit);

        assert_eq!(trip.name, "Renamed");
        assert!(trip.status.is_ongoing());
    }

    #[test]
    fn test_record_action_initializes_then_counts() {
        let mut trip = Trip::new(draft(), "ABC123");
        let member = UserId::new("alice");
        assert!(trip.stats_for(&member).is_none());

        let stats = trip.record_action(&member, StatAction::AddPhoto);
        assert_eq!(stats.photos_added, 1);
        assert_eq!(stats.votes_cast, 0);

        let stats = trip.record_action(&member, StatAction::AddPhoto);
        assert_eq!(stats.photos_added, 2);
    }

    #[test]
    fn test_end_requires_ongoing() {
        let mut upcoming = Trip::new(draft(), "ABC123");
        assert!(matches!(
            upcoming.end(),
            Err(TripError::TripNotOngoing(TripStatus::Upcoming))
        ));

        let mut ongoing = Trip::new(draft(), "DEF456").with_status(TripStatus::Ongoing);
        ongoing.end().unwrap();
        assert!(ongoing.status.is_ended());

        assert!(matches!(
            ongoing.end(),
            Err(TripError::TripNotOngoing(TripStatus::Ended))
        ));
    }
}
