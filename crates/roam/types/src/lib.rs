//! Roam Domain Types
//!
//! Shared data model for the Roam group travel planner. These types
//! carry trips, itineraries, photos, polls, and notifications between
//! the stores that own them. They enforce local invariants (field
//! validation, vote-set semantics, status transitions) and nothing
//! else; cross-record coordination lives in the store crates built on
//! top of them.
//!
//! # Key Principle
//!
//! Records are plain owned data. Constructors generate ids, builders
//! fill optional fields, and every fallible operation returns a typed
//! [`TripError`]. There is no global state anywhere in this crate.

#![deny(unsafe_code)]

pub mod clock;
mod itinerary;
mod notification;
mod photo;
mod poll;
mod recap;
mod trip;

pub use itinerary::{ItineraryDraft, ItineraryItem, ItineraryItemId, ItineraryKind};
pub use notification::{
    Announcement, AnnouncementId, Notification, NotificationId, NotificationKind, SYSTEM_AUTHOR,
};
pub use photo::{Photo, PhotoId};
pub use poll::{Poll, PollId, PollOption, PollOptionDraft, PollOptionId, VoteToggle};
pub use recap::{Award, MemoryChallenge, RouteStop};
pub use trip::{
    StatAction, Trip, TripDraft, TripEdit, TripId, TripStatus, User, UserId, UserStats,
};

use thiserror::Error;

/// Errors produced by the trip planning core
#[derive(Debug, Error)]
pub enum TripError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Trip not found: {0}")]
    TripNotFound(TripId),

    #[error("Trip is not open in this session: {0}")]
    TripNotOpen(TripId),

    #[error("Itinerary item not found: {0}")]
    ItemNotFound(ItineraryItemId),

    #[error("Poll not found: {0}")]
    PollNotFound(PollId),

    #[error("Poll option not found: {0}")]
    OptionNotFound(PollOptionId),

    #[error("Photo not found: {0}")]
    PhotoNotFound(PhotoId),

    #[error("No trip matches join code: {0}")]
    UnknownJoinCode(String),

    #[error("Trip is not ongoing (status: {0})")]
    TripNotOngoing(TripStatus),

    #[error("Only the photo owner may edit tags: {0}")]
    NotPhotoOwner(PhotoId),
}

pub type TripResult<T> = Result<T, TripError>;
