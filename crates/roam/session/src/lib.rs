//! Roam Trip Session
//!
//! Composition root for one signed-in user. The session owns the trip
//! registry and a lazily-created space (itinerary store plus
//! collaboration hub) per opened trip, and it is the layer that wires
//! cross-cutting behavior together: engagement stats recorded exactly
//! once per qualifying action, notifications emitted alongside the
//! actions that cause them, and the owner-only contract on photo tags.
//!
//! # Architecture
//!
//! ```text
//! TripSession
//!   ├── TripRegistry          lifecycle, join codes, stats
//!   ├── TripSpace (per trip)
//!   │     ├── ItineraryStore  sorted items, timeline
//!   │     └── CollaborationHub polls, photos, notifications
//!   └── Arc<dyn BlobStore>    media upload boundary
//! ```

#![deny(unsafe_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use roam_capability::{BlobStore, CapabilityError, InMemoryBlobStore, MediaBlob};
use roam_collab::CollaborationHub;
use roam_itinerary::ItineraryStore;
use roam_lifecycle::{TripRegistry, TripViewMode};
use roam_types::{
    Announcement, ItineraryDraft, ItineraryItem, ItineraryItemId, NotificationKind, Photo,
    PhotoId, Poll, PollId, PollOptionDraft, PollOptionId, StatAction, Trip, TripDraft, TripEdit,
    TripError, TripId, TripResult, TripStatus, User, UserId, VoteToggle,
};
use thiserror::Error;
use tracing::info;

/// Session-level failures: core rule violations or collaborator
/// failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Trip error: {0}")]
    Trip(#[from] TripError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Per-trip stores, created the first time a trip is opened
#[derive(Debug)]
pub struct TripSpace {
    pub itinerary: ItineraryStore,
    pub collab: CollaborationHub,
}

/// One user's view of Roam: their trips and everything inside them
pub struct TripSession {
    user: User,
    registry: TripRegistry,
    spaces: HashMap<TripId, TripSpace>,
    blobs: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for TripSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripSession")
            .field("user", &self.user.id)
            .field("trips", &self.registry.trips().len())
            .field("open_spaces", &self.spaces.len())
            .finish()
    }
}

impl TripSession {
    /// Session backed by the in-memory blob store
    pub fn new(user: User) -> Self {
        Self {
            user,
            registry: TripRegistry::new(),
            spaces: HashMap::new(),
            blobs: Arc::new(InMemoryBlobStore),
        }
    }

    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    /// Sign-in shim: build the session user from a display name
    pub fn sign_in(name: impl Into<String>) -> SessionResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TripError::Validation("display name must not be empty".into()).into());
        }
        Ok(Self::new(User::new(name)))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn registry(&self) -> &TripRegistry {
        &self.registry
    }

    /// Inject a pre-existing trip (demo data, imports)
    pub fn seed_trip(&mut self, trip: Trip) {
        self.registry.seed(trip);
    }

    /// Create a trip owned by the session user
    pub fn create_trip(&mut self, mut draft: TripDraft) -> SessionResult<Trip> {
        draft.created_by = self.user.clone();
        Ok(self.registry.create(draft)?)
    }

    /// Join a trip by its shared code
    pub fn join_trip(&mut self, code: &str) -> SessionResult<Trip> {
        Ok(self.registry.join_by_code(code, self.user.clone())?)
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.registry.get(id)
    }

    /// Dashboard filter
    pub fn trips_by_status(&self, status: TripStatus) -> Vec<&Trip> {
        self.registry.by_status(status)
    }

    /// Open a trip. The first open of a session creates the trip
    /// space, posts the welcome announcement, and counts one app-open
    /// for the user; later opens are free.
    pub fn open_trip(&mut self, id: &TripId) -> SessionResult<TripViewMode> {
        let trip = self
            .registry
            .get(id)
            .ok_or_else(|| TripError::TripNotFound(id.clone()))?
            .clone();

        if !self.spaces.contains_key(id) {
            let mut collab = CollaborationHub::new(id.clone());
            collab.post_announcement(
                Announcement::system(format!(
                    "Welcome to {}! Join code: {}",
                    trip.name, trip.join_code
                ))
                .important(),
            );
            self.spaces.insert(
                id.clone(),
                TripSpace {
                    itinerary: ItineraryStore::new(id.clone()),
                    collab,
                },
            );
            self.registry
                .record_action(id, &self.user.id, StatAction::OpenTrip)?;
            info!(trip = %id.short(), member = %self.user.id, "Trip opened");
        }

        Ok(TripViewMode::of(&trip))
    }

    /// Stores of an opened trip
    pub fn space(&self, id: &TripId) -> Option<&TripSpace> {
        self.spaces.get(id)
    }

    fn space_ref(&self, id: &TripId) -> TripResult<&TripSpace> {
        self.spaces
            .get(id)
            .ok_or_else(|| TripError::TripNotOpen(id.clone()))
    }

    fn space_mut(&mut self, id: &TripId) -> TripResult<&mut TripSpace> {
        self.spaces
            .get_mut(id)
            .ok_or_else(|| TripError::TripNotOpen(id.clone()))
    }

    /// Owner edit of trip details
    pub fn update_trip(&mut self, trip_id: &TripId, edit: TripEdit) -> SessionResult<Trip> {
        Ok(self.registry.update_details(trip_id, edit)?)
    }

    /// End an ongoing trip; the recap surfaces take over from here
    pub fn end_trip(&mut self, trip_id: &TripId) -> SessionResult<TripStatus> {
        Ok(self.registry.end_trip(trip_id)?)
    }

    pub fn view_mode(&self, trip_id: &TripId) -> SessionResult<TripViewMode> {
        let trip = self
            .registry
            .get(trip_id)
            .ok_or_else(|| TripError::TripNotFound(trip_id.clone()))?;
        Ok(TripViewMode::of(trip))
    }

    // --- Itinerary ---

    /// Read one item, counting an itinerary view
    pub fn view_item(
        &mut self,
        trip_id: &TripId,
        item_id: &ItineraryItemId,
    ) -> SessionResult<ItineraryItem> {
        let space = self.space_ref(trip_id)?;
        let item = space
            .itinerary
            .get(item_id)
            .cloned()
            .ok_or_else(|| TripError::ItemNotFound(item_id.clone()))?;
        self.registry
            .record_action(trip_id, &self.user.id, StatAction::ViewItinerary)?;
        Ok(item)
    }

    /// Create or update an itinerary item; either counts as one edit
    pub fn save_item(
        &mut self,
        trip_id: &TripId,
        item_id: Option<&ItineraryItemId>,
        draft: ItineraryDraft,
    ) -> SessionResult<ItineraryItem> {
        let space = self.space_mut(trip_id)?;
        let saved = match item_id {
            Some(id) => space.itinerary.update(id, draft)?,
            None => space.itinerary.add(draft)?,
        };
        self.registry
            .record_action(trip_id, &self.user.id, StatAction::EditItinerary)?;
        Ok(saved)
    }

    /// Delete an item; photos linked to it keep their weak reference
    pub fn delete_item(
        &mut self,
        trip_id: &TripId,
        item_id: &ItineraryItemId,
    ) -> SessionResult<ItineraryItem> {
        let space = self.space_mut(trip_id)?;
        Ok(space.itinerary.remove(item_id)?)
    }

    // --- Photos ---

    /// Run bytes through the blob store and hand back the reference
    pub async fn read_blob(&self, blob: MediaBlob) -> SessionResult<String> {
        Ok(self.blobs.read_as_data_reference(blob).await?)
    }

    /// Upload and share a photo, notifying the group and counting one
    /// photo for the user
    pub async fn add_photo(
        &mut self,
        trip_id: &TripId,
        blob: MediaBlob,
        linked_item: Option<ItineraryItemId>,
    ) -> SessionResult<Photo> {
        let destination = self
            .registry
            .get(trip_id)
            .ok_or_else(|| TripError::TripNotFound(trip_id.clone()))?
            .destination
            .clone();
        let url = self.blobs.read_as_data_reference(blob).await?;

        let owner = self.user.id.clone();
        let sharer = self.user.name.clone();
        let space = self.space_mut(trip_id)?;
        let photo = space.collab.add_photo(owner, url, linked_item, &destination);
        space.collab.notify_with_related(
            NotificationKind::Photo,
            format!("{sharer} added a new photo"),
            photo.id.0.clone(),
        );
        self.registry
            .record_action(trip_id, &self.user.id, StatAction::AddPhoto)?;
        Ok(photo)
    }

    /// Replace a photo's tags. Only the photo's owner may do this;
    /// tagging at least one member notifies the group.
    pub fn set_photo_tags(
        &mut self,
        trip_id: &TripId,
        photo_id: &PhotoId,
        members: BTreeSet<UserId>,
    ) -> SessionResult<Photo> {
        let tagger = self.user.clone();
        let space = self.space_mut(trip_id)?;
        let owner = space
            .collab
            .photo(photo_id)
            .map(|photo| photo.owner.clone())
            .ok_or_else(|| TripError::PhotoNotFound(photo_id.clone()))?;
        if owner != tagger.id {
            return Err(TripError::NotPhotoOwner(photo_id.clone()).into());
        }

        let notify = !members.is_empty();
        let photo = space.collab.set_tags(photo_id, members)?;
        if notify {
            space.collab.notify_with_related(
                NotificationKind::Tag,
                format!("{} tagged friends in a photo", tagger.name),
                photo_id.0.clone(),
            );
        }
        Ok(photo)
    }

    // --- Polls ---

    /// Open a poll and notify the group
    pub fn create_poll(
        &mut self,
        trip_id: &TripId,
        question: impl Into<String>,
        options: Vec<PollOptionDraft>,
    ) -> SessionResult<Poll> {
        let creator = self.user.id.clone();
        let space = self.space_mut(trip_id)?;
        let poll = space.collab.create_poll(question, creator, options)?;
        space.collab.notify_with_related(
            NotificationKind::Poll,
            "A new poll has been created!",
            poll.id.0.clone(),
        );
        Ok(poll)
    }

    /// Toggle the session user's vote; only a newly cast vote counts
    /// toward stats, a retraction never does
    pub fn toggle_vote(
        &mut self,
        trip_id: &TripId,
        poll_id: &PollId,
        option_id: &PollOptionId,
    ) -> SessionResult<VoteToggle> {
        let voter = self.user.id.clone();
        let space = self.space_mut(trip_id)?;
        let toggle = space.collab.toggle_vote(poll_id, option_id, &voter)?;
        if toggle.is_cast() {
            self.registry
                .record_action(trip_id, &voter, StatAction::CastVote)?;
        }
        Ok(toggle)
    }

    pub fn close_poll(&mut self, trip_id: &TripId, poll_id: &PollId) -> SessionResult<()> {
        let space = self.space_mut(trip_id)?;
        Ok(space.collab.close_poll(poll_id)?)
    }

    // --- Notifications ---

    pub fn unread_notifications(&self, trip_id: &TripId) -> SessionResult<usize> {
        Ok(self.space_ref(trip_id)?.collab.unread_count())
    }

    pub fn mark_notifications_read(&mut self, trip_id: &TripId) -> SessionResult<()> {
        self.space_mut(trip_id)?.collab.mark_all_read();
        Ok(())
    }
}
