//! Roam Trip Registry
//!
//! Owns the collection of trips a session can see and every lifecycle
//! command over them: creation with a collision-free join code, member
//! joins by code, owner edits, dashboard filtering by status, the
//! one-way end-trip transition, and engagement stat recording.
//!
//! # Key Principle
//!
//! Status never moves as a side effect. Creation pins Upcoming, detail
//! edits cannot carry a status, and the only transition the registry
//! performs itself is the explicit Ongoing-to-Ended command. Trips
//! that are already underway enter through [`TripRegistry::seed`].

#![deny(unsafe_code)]

use rand::Rng;
use roam_types::{
    StatAction, Trip, TripDraft, TripEdit, TripError, TripId, TripResult, TripStatus, User,
    UserId, UserStats,
};
use tracing::{info, warn};

/// Join codes are short enough to share aloud and unambiguous in caps
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const JOIN_CODE_LEN: usize = 6;

/// Which surface a trip presents when opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripViewMode {
    /// Live planning: itinerary, polls, photo sharing
    Planning,
    /// Read-only memories: awards, highlight video, route map
    Recap,
}

impl TripViewMode {
    /// Ended trips present recap surfaces; everything else plans
    pub fn of(trip: &Trip) -> Self {
        if trip.status.is_ended() {
            TripViewMode::Recap
        } else {
            TripViewMode::Planning
        }
    }
}

/// Collection of trips plus the commands that move them
#[derive(Debug, Default)]
pub struct TripRegistry {
    trips: Vec<Trip>,
}

impl TripRegistry {
    pub fn new() -> Self {
        Self { trips: Vec::new() }
    }

    /// Inject a pre-existing trip (demo data, imports); any status is
    /// accepted as-is
    pub fn seed(&mut self, trip: Trip) {
        self.trips.insert(0, trip);
    }

    /// Create a trip from a draft; newest trips list first
    pub fn create(&mut self, draft: TripDraft) -> TripResult<Trip> {
        draft.validate()?;
        let join_code = self.unique_join_code();
        let trip = Trip::new(draft, join_code);
        let snapshot = trip.clone();
        self.trips.insert(0, trip);
        info!(
            trip = %snapshot.id.short(),
            name = %snapshot.name,
            code = %snapshot.join_code,
            "Trip created"
        );
        Ok(snapshot)
    }

    /// Roll join codes until one is unused by any current trip
    fn unique_join_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..JOIN_CODE_LEN)
                .map(|_| {
                    let index = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
                    JOIN_CODE_ALPHABET[index] as char
                })
                .collect();
            if self.find_by_join_code(&code).is_none() {
                return code;
            }
        }
    }

    pub fn get(&self, id: &TripId) -> Option<&Trip> {
        self.trips.iter().find(|trip| &trip.id == id)
    }

    fn trip_mut(&mut self, id: &TripId) -> TripResult<&mut Trip> {
        self.trips
            .iter_mut()
            .find(|trip| &trip.id == id)
            .ok_or_else(|| TripError::TripNotFound(id.clone()))
    }

    /// All trips, newest first
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Dashboard filter: trips in one lifecycle bucket
    pub fn by_status(&self, status: TripStatus) -> Vec<&Trip> {
        self.trips
            .iter()
            .filter(|trip| trip.status == status)
            .collect()
    }

    /// Case-insensitive join code lookup
    pub fn find_by_join_code(&self, code: &str) -> Option<&Trip> {
        let code = code.trim();
        self.trips
            .iter()
            .find(|trip| trip.join_code.eq_ignore_ascii_case(code))
    }

    /// Add a user to the trip matching a shared join code
    pub fn join_by_code(&mut self, code: &str, user: User) -> TripResult<Trip> {
        let code = code.trim();
        let trip = self
            .trips
            .iter_mut()
            .find(|trip| trip.join_code.eq_ignore_ascii_case(code))
            .ok_or_else(|| TripError::UnknownJoinCode(code.to_string()))?;
        trip.add_member(user.clone());
        info!(trip = %trip.id.short(), member = %user.id, "Member joined via code");
        Ok(trip.clone())
    }

    /// Owner edit of trip details; lifecycle status is never touched
    pub fn update_details(&mut self, id: &TripId, edit: TripEdit) -> TripResult<Trip> {
        edit.validate()?;
        let trip = self.trip_mut(id)?;
        trip.apply_edit(edit);
        info!(trip = %trip.id.short(), "Trip details updated");
        Ok(trip.clone())
    }

    /// End an ongoing trip. One-way: there is no command back out of
    /// Ended, and trips that never started cannot end.
    pub fn end_trip(&mut self, id: &TripId) -> TripResult<TripStatus> {
        let trip = self.trip_mut(id)?;
        match trip.end() {
            Ok(()) => {
                info!(trip = %trip.id.short(), "Trip ended");
                Ok(trip.status)
            }
            Err(err) => {
                warn!(
                    trip = %trip.id.short(),
                    status = %trip.status,
                    "Rejected end-trip command"
                );
                Err(err)
            }
        }
    }

    /// Count one qualifying member action against a trip
    pub fn record_action(
        &mut self,
        id: &TripId,
        member: &UserId,
        action: StatAction,
    ) -> TripResult<UserStats> {
        let trip = self.trip_mut(id)?;
        Ok(trip.record_action(member, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(name: &str) -> TripDraft {
        TripDraft::new(
            name,
            "Tokyo, Japan",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            User::new("Alice").with_id(UserId::new("alice")),
        )
    }

    fn registry_with(name: &str) -> (TripRegistry, Trip) {
        let mut registry = TripRegistry::new();
        let trip = registry.create(draft(name)).unwrap();
        (registry, trip)
    }

    #[test]
    fn test_create_pins_status_and_shapes_join_code() {
        let (_, trip) = registry_with("Tokyo Adventure");
        assert!(trip.status.is_upcoming());
        assert_eq!(trip.join_code.len(), JOIN_CODE_LEN);
        assert!(trip
            .join_code
            .bytes()
            .all(|b| JOIN_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_create_rejects_invalid_draft() {
        let mut registry = TripRegistry::new();
        let mut bad = draft("Tokyo");
        bad.destination = String::new();
        assert!(matches!(
            registry.create(bad),
            Err(TripError::Validation(_))
        ));
        assert!(registry.trips().is_empty());
    }

    #[test]
    fn test_join_codes_are_unique() {
        let mut registry = TripRegistry::new();
        let mut codes = std::collections::HashSet::new();
        for i in 0..50 {
            let trip = registry.create(draft(&format!("Trip {i}"))).unwrap();
            assert!(codes.insert(trip.join_code));
        }
    }

    #[test]
    fn test_newest_trips_list_first() {
        let mut registry = TripRegistry::new();
        registry.create(draft("First")).unwrap();
        registry.create(draft("Second")).unwrap();
        let names: Vec<_> = registry.trips().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn test_by_status_buckets() {
        let mut registry = TripRegistry::new();
        registry.create(draft("Planning")).unwrap();
        registry.seed(Trip::new(draft("Underway"), "AAAAA1").with_status(TripStatus::Ongoing));
        registry.seed(Trip::new(draft("Done"), "AAAAA2").with_status(TripStatus::Ended));

        assert_eq!(registry.by_status(TripStatus::Upcoming).len(), 1);
        assert_eq!(registry.by_status(TripStatus::Ongoing).len(), 1);
        assert_eq!(registry.by_status(TripStatus::Ended).len(), 1);
    }

    #[test]
    fn test_join_by_code_is_case_insensitive() {
        let (mut registry, trip) = registry_with("Tokyo");
        let code = trip.join_code.to_lowercase();
        let bob = User::new("Bob").with_id(UserId::new("bob"));

        let joined = registry.join_by_code(&format!("  {code} "), bob).unwrap();
        assert!(joined.is_member(&UserId::new("bob")));
    }

    #[test]
    fn test_join_by_unknown_code() {
        let mut registry = TripRegistry::new();
        let result = registry.join_by_code("NOPE99", User::new("Bob"));
        assert!(matches!(result, Err(TripError::UnknownJoinCode(_))));
    }

    #[test]
    fn test_update_details_cannot_move_status() {
        let mut registry = TripRegistry::new();
        let trip = Trip::new(draft("Underway"), "AAAAA1").with_status(TripStatus::Ongoing);
        let id = trip.id.clone();
        registry.seed(trip);

        let mut edit = TripEdit::from_trip(registry.get(&id).unwrap());
        edit.name = "Renamed".into();
        let updated = registry.update_details(&id, edit).unwrap();

        assert_eq!(updated.name, "Renamed");
        assert!(updated.status.is_ongoing());
    }

    #[test]
    fn test_update_details_unknown_trip() {
        let (mut registry, trip) = registry_with("Tokyo");
        let edit = TripEdit::from_trip(&trip);
        let result = registry.update_details(&TripId::new("missing"), edit);
        assert!(matches!(result, Err(TripError::TripNotFound(_))));
    }

    #[test]
    fn test_end_trip_transition_matrix() {
        let (mut registry, upcoming) = registry_with("Tokyo");
        assert!(matches!(
            registry.end_trip(&upcoming.id),
            Err(TripError::TripNotOngoing(TripStatus::Upcoming))
        ));

        let ongoing = Trip::new(draft("Underway"), "AAAAA1").with_status(TripStatus::Ongoing);
        let id = ongoing.id.clone();
        registry.seed(ongoing);

        assert_eq!(registry.end_trip(&id).unwrap(), TripStatus::Ended);
        assert!(matches!(
            registry.end_trip(&id),
            Err(TripError::TripNotOngoing(TripStatus::Ended))
        ));
    }

    #[test]
    fn test_record_action_accumulates() {
        let (mut registry, trip) = registry_with("Tokyo");
        let alice = UserId::new("alice");

        registry
            .record_action(&trip.id, &alice, StatAction::EditItinerary)
            .unwrap();
        let stats = registry
            .record_action(&trip.id, &alice, StatAction::EditItinerary)
            .unwrap();

        assert_eq!(stats.itinerary_edits, 2);
        assert_eq!(stats.photos_added, 0);
    }

    #[test]
    fn test_view_mode_follows_status() {
        let planning = Trip::new(draft("Soon"), "AAAAA1");
        assert_eq!(TripViewMode::of(&planning), TripViewMode::Planning);

        let ongoing = Trip::new(draft("Now"), "AAAAA2").with_status(TripStatus::Ongoing);
        assert_eq!(TripViewMode::of(&ongoing), TripViewMode::Planning);

        let done = Trip::new(draft("Past"), "AAAAA3").with_status(TripStatus::Ended);
        assert_eq!(TripViewMode::of(&done), TripViewMode::Recap);
    }
}
