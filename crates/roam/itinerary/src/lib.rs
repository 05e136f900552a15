//! Roam Itinerary Store
//!
//! Owns the itinerary of exactly one trip. Items stay sorted by start
//! time after every mutation, using a stable sort so that items sharing
//! a start time keep their insertion order. The timeline derivation
//! walks the sorted list and decides, per neighbor pair, whether to
//! render a stop, a transport connector, or a travel-gap affordance.
//!
//! # Key Principle
//!
//! The sorted item list is the single source of truth. Timelines and
//! route maps are derived views computed on demand; nothing in here
//! caches render state.

#![deny(unsafe_code)]

use chrono::NaiveDateTime;
use roam_types::{
    clock, ItineraryDraft, ItineraryItem, ItineraryItemId, RouteStop, TripError, TripId,
    TripResult,
};
use tracing::info;

pub use roam_types::clock::duration_label;

/// Sorted itinerary collection for one trip
#[derive(Clone, Debug)]
pub struct ItineraryStore {
    trip_id: TripId,
    items: Vec<ItineraryItem>,
}

impl ItineraryStore {
    /// Create an empty store bound to a trip
    pub fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            items: Vec::new(),
        }
    }

    /// Build a store from pre-existing items, sorting them on entry
    pub fn from_items(trip_id: TripId, mut items: Vec<ItineraryItem>) -> Self {
        items.sort_by_key(|item| item.start_time);
        Self { trip_id, items }
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    /// Validate and add a new item, returning the stored record
    pub fn add(&mut self, draft: ItineraryDraft) -> TripResult<ItineraryItem> {
        draft.validate()?;
        let item = ItineraryItem::new(self.trip_id.clone(), draft);
        let stored = item.clone();
        self.items.push(item);
        self.items.sort_by_key(|item| item.start_time);
        info!(
            trip = %self.trip_id.short(),
            item = %stored.id,
            kind = %stored.kind,
            "Itinerary item added"
        );
        Ok(stored)
    }

    /// Replace an item's editable fields and re-sort
    pub fn update(&mut self, id: &ItineraryItemId, draft: ItineraryDraft) -> TripResult<ItineraryItem> {
        draft.validate()?;
        let item = self
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| TripError::ItemNotFound(id.clone()))?;
        item.apply(draft);
        let updated = item.clone();
        self.items.sort_by_key(|item| item.start_time);
        info!(trip = %self.trip_id.short(), item = %id, "Itinerary item updated");
        Ok(updated)
    }

    /// Remove an item, returning it
    pub fn remove(&mut self, id: &ItineraryItemId) -> TripResult<ItineraryItem> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| TripError::ItemNotFound(id.clone()))?;
        let removed = self.items.remove(index);
        info!(trip = %self.trip_id.short(), item = %id, "Itinerary item removed");
        Ok(removed)
    }

    pub fn get(&self, id: &ItineraryItemId) -> Option<&ItineraryItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Items in start-time order
    pub fn items(&self) -> &[ItineraryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Derive the render timeline from the current items
    pub fn timeline(&self) -> Timeline<'_> {
        Timeline {
            items: &self.items,
            index: 0,
            pending_gap: None,
        }
    }

    /// Stops for the recap route map, in travel order
    pub fn route(&self) -> Vec<RouteStop> {
        self.items
            .iter()
            .map(|item| RouteStop {
                label: item
                    .location
                    .clone()
                    .unwrap_or_else(|| item.title.clone()),
                kind: item.kind,
                starts_at: item.start_time,
            })
            .collect()
    }
}

/// One rendered segment of the trip timeline
#[derive(Clone, Debug)]
pub enum TimelineSegment<'a> {
    /// A regular activity card
    Stop(&'a ItineraryItem),
    /// A transport leg drawn as a connector, with its duration label
    Transit {
        item: &'a ItineraryItem,
        duration: String,
    },
    /// Free time between two non-transport stops, offered for filling
    /// with a transport item
    TravelGap {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
}

impl TimelineSegment<'_> {
    pub fn is_travel_gap(&self) -> bool {
        matches!(self, TimelineSegment::TravelGap { .. })
    }
}

/// Iterator over timeline segments in display order
///
/// A gap appears between consecutive items exactly when neither side
/// is a transport leg. The gap starts at the earlier item's end time,
/// falling back to its start time for open-ended items.
pub struct Timeline<'a> {
    items: &'a [ItineraryItem],
    index: usize,
    pending_gap: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl<'a> Iterator for Timeline<'a> {
    type Item = TimelineSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((from, to)) = self.pending_gap.take() {
            return Some(TimelineSegment::TravelGap { from, to });
        }

        let item = self.items.get(self.index)?;
        self.index += 1;

        if let Some(next) = self.items.get(self.index) {
            if !item.is_transport() && !next.is_transport() {
                let from = item.end_time.unwrap_or(item.start_time);
                self.pending_gap = Some((from, next.start_time));
            }
        }

        if item.is_transport() {
            Some(TimelineSegment::Transit {
                item,
                duration: clock::duration_label(item.start_time, item.end_time),
            })
        } else {
            Some(TimelineSegment::Stop(item))
        }
    }
}
