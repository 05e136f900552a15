//! Roam Collaboration Hub
//!
//! Owns the social collections of one trip: decision polls, the shared
//! photo feed, per-member notifications, and pinned announcements. The
//! hub reads itinerary ids to resolve photo links but never mutates
//! the itinerary, and photo links are weak: a link whose item has been
//! deleted simply reads as unlinked.

#![deny(unsafe_code)]

use std::collections::BTreeSet;

use roam_itinerary::ItineraryStore;
use roam_types::{
    Announcement, ItineraryItemId, Notification, NotificationKind, Photo, PhotoId, Poll, PollId,
    PollOptionDraft, PollOptionId, TripError, TripId, TripResult, UserId, VoteToggle,
};
use tracing::info;

/// Caption applied to photos attached to an itinerary item
const LINKED_PHOTO_CAPTION: &str = "Added to itinerary";
/// Caption applied to loose photos shared into the feed
const LOOSE_PHOTO_CAPTION: &str = "Shared a moment!";

/// Social state of one trip
#[derive(Clone, Debug)]
pub struct CollaborationHub {
    trip_id: TripId,
    polls: Vec<Poll>,
    photos: Vec<Photo>,
    notifications: Vec<Notification>,
    announcements: Vec<Announcement>,
}

impl CollaborationHub {
    pub fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            polls: Vec::new(),
            photos: Vec::new(),
            notifications: Vec::new(),
            announcements: Vec::new(),
        }
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    // --- Polls ---

    /// Open a poll; question and every option need non-blank text
    pub fn create_poll(
        &mut self,
        question: impl Into<String>,
        created_by: UserId,
        options: Vec<PollOptionDraft>,
    ) -> TripResult<Poll> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(TripError::Validation(
                "poll question must not be empty".into(),
            ));
        }
        if options.is_empty() {
            return Err(TripError::Validation(
                "poll needs at least one option".into(),
            ));
        }
        if options.iter().any(|option| option.text.trim().is_empty()) {
            return Err(TripError::Validation(
                "poll option text must not be empty".into(),
            ));
        }

        let poll = Poll::new(question, created_by, options);
        let snapshot = poll.clone();
        self.polls.insert(0, poll);
        info!(trip = %self.trip_id.short(), poll = %snapshot.id, "Poll created");
        Ok(snapshot)
    }

    /// Toggle a member's vote on one option: cast when absent,
    /// retract when present
    pub fn toggle_vote(
        &mut self,
        poll_id: &PollId,
        option_id: &PollOptionId,
        member: &UserId,
    ) -> TripResult<VoteToggle> {
        let poll = self
            .polls
            .iter_mut()
            .find(|poll| &poll.id == poll_id)
            .ok_or_else(|| TripError::PollNotFound(poll_id.clone()))?;
        let option = poll
            .option_mut(option_id)
            .ok_or_else(|| TripError::OptionNotFound(option_id.clone()))?;
        let toggle = option.toggle(member);
        info!(
            trip = %self.trip_id.short(),
            poll = %poll_id,
            option = %option_id,
            member = %member,
            outcome = ?toggle,
            "Vote toggled"
        );
        Ok(toggle)
    }

    /// Close a poll to further display as active; votes stay intact
    pub fn close_poll(&mut self, poll_id: &PollId) -> TripResult<()> {
        let poll = self
            .polls
            .iter_mut()
            .find(|poll| &poll.id == poll_id)
            .ok_or_else(|| TripError::PollNotFound(poll_id.clone()))?;
        poll.is_active = false;
        info!(trip = %self.trip_id.short(), poll = %poll_id, "Poll closed");
        Ok(())
    }

    /// Display percentage for one option of a poll
    pub fn vote_percent(&self, poll_id: &PollId, option_id: &PollOptionId) -> TripResult<u32> {
        let poll = self
            .poll(poll_id)
            .ok_or_else(|| TripError::PollNotFound(poll_id.clone()))?;
        poll.vote_percent(option_id)
            .ok_or_else(|| TripError::OptionNotFound(option_id.clone()))
    }

    pub fn poll(&self, id: &PollId) -> Option<&Poll> {
        self.polls.iter().find(|poll| &poll.id == id)
    }

    /// Polls, newest first
    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }

    // --- Photos ---

    /// Share a photo into the trip. Photos attached to an itinerary
    /// item get the itinerary caption; loose photos get the generic
    /// caption and fall back to the trip destination for location.
    pub fn add_photo(
        &mut self,
        owner: UserId,
        url: impl Into<String>,
        linked_item: Option<ItineraryItemId>,
        destination: &str,
    ) -> Photo {
        let mut photo = Photo::new(owner, url);
        match linked_item {
            Some(item_id) => {
                photo = photo
                    .with_linked_item(item_id)
                    .with_caption(LINKED_PHOTO_CAPTION);
            }
            None => {
                photo = photo
                    .with_caption(LOOSE_PHOTO_CAPTION)
                    .with_location(destination);
            }
        }
        let snapshot = photo.clone();
        self.photos.push(photo);
        info!(
            trip = %self.trip_id.short(),
            photo = %snapshot.id,
            linked = snapshot.is_linked(),
            "Photo shared"
        );
        snapshot
    }

    /// Replace a photo's tag set wholesale. Callers enforce that only
    /// the photo's owner reaches this method.
    pub fn set_tags(&mut self, photo_id: &PhotoId, members: BTreeSet<UserId>) -> TripResult<Photo> {
        let photo = self
            .photos
            .iter_mut()
            .find(|photo| &photo.id == photo_id)
            .ok_or_else(|| TripError::PhotoNotFound(photo_id.clone()))?;
        photo.tagged = members;
        info!(
            trip = %self.trip_id.short(),
            photo = %photo_id,
            tagged = photo.tagged.len(),
            "Photo tags replaced"
        );
        Ok(photo.clone())
    }

    pub fn photo(&self, id: &PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|photo| &photo.id == id)
    }

    /// Photos in the order they were shared
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Photos newest first, as the feed renders them
    pub fn feed(&self) -> Vec<&Photo> {
        self.photos.iter().rev().collect()
    }

    /// Resolve a photo's itinerary link to the item title. A link
    /// whose item no longer exists reads as unlinked, never an error.
    pub fn linked_item_title<'a>(
        &self,
        photo_id: &PhotoId,
        itinerary: &'a ItineraryStore,
    ) -> Option<&'a str> {
        let photo = self.photo(photo_id)?;
        let item_id = photo.itinerary_item_id.as_ref()?;
        itinerary.get(item_id).map(|item| item.title.as_str())
    }

    // --- Notifications ---

    /// Prepend an unread notification
    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        let notification = Notification::new(kind, message);
        let snapshot = notification.clone();
        self.notifications.insert(0, notification);
        snapshot
    }

    /// Prepend an unread notification pointing at a poll, photo, or
    /// announcement
    pub fn notify_with_related(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        related_id: impl Into<String>,
    ) -> Notification {
        let notification = Notification::new(kind, message).with_related_id(related_id);
        let snapshot = notification.clone();
        self.notifications.insert(0, notification);
        snapshot
    }

    /// Opening the notification tray clears the unread state in bulk
    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.is_read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|notification| !notification.is_read)
            .count()
    }

    /// Notifications, newest first
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    // --- Announcements ---

    /// Pin an announcement, newest first
    pub fn post_announcement(&mut self, announcement: Announcement) -> Announcement {
        let snapshot = announcement.clone();
        self.announcements.insert(0, announcement);
        info!(
            trip = %self.trip_id.short(),
            announcement = %snapshot.id,
            important = snapshot.is_important,
            "Announcement posted"
        );
        snapshot
    }

    /// Announcements, newest first
    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_itinerary::ItineraryStore;
    use roam_types::{clock, ItineraryDraft, ItineraryKind};

    fn hub() -> CollaborationHub {
        CollaborationHub::new(TripId::new("trip-1"))
    }

    fn options() -> Vec<PollOptionDraft> {
        vec![
            PollOptionDraft::new("Sushi"),
            PollOptionDraft::new("Ramen"),
        ]
    }

    #[test]
    fn test_create_poll_validates_inputs() {
        let mut hub = hub();
        assert!(matches!(
            hub.create_poll("  ", UserId::new("alice"), options()),
            Err(TripError::Validation(_))
        ));
        assert!(matches!(
            hub.create_poll("Dinner?", UserId::new("alice"), vec![]),
            Err(TripError::Validation(_))
        ));
        assert!(matches!(
            hub.create_poll(
                "Dinner?",
                UserId::new("alice"),
                vec![PollOptionDraft::new("")]
            ),
            Err(TripError::Validation(_))
        ));
        assert!(hub.polls().is_empty());
    }

    #[test]
    fn test_newest_poll_lists_first() {
        let mut hub = hub();
        hub.create_poll("First?", UserId::new("alice"), options())
            .unwrap();
        hub.create_poll("Second?", UserId::new("alice"), options())
            .unwrap();
        assert_eq!(hub.polls()[0].question, "Second?");
    }

    #[test]
    fn test_toggle_vote_round_trip() {
        let mut hub = hub();
        let poll = hub
            .create_poll("Dinner?", UserId::new("alice"), options())
            .unwrap();
        let option_id = poll.options[0].id.clone();
        let bob = UserId::new("bob");

        assert_eq!(
            hub.toggle_vote(&poll.id, &option_id, &bob).unwrap(),
            VoteToggle::Cast
        );
        assert_eq!(
            hub.toggle_vote(&poll.id, &option_id, &bob).unwrap(),
            VoteToggle::Retracted
        );
        assert!(!hub.poll(&poll.id).unwrap().options[0].has_vote(&bob));
    }

    #[test]
    fn test_toggle_vote_unknown_targets() {
        let mut hub = hub();
        let poll = hub
            .create_poll("Dinner?", UserId::new("alice"), options())
            .unwrap();

        assert!(matches!(
            hub.toggle_vote(&PollId::new("nope"), &poll.options[0].id, &UserId::new("bob")),
            Err(TripError::PollNotFound(_))
        ));
        assert!(matches!(
            hub.toggle_vote(&poll.id, &PollOptionId::new("nope"), &UserId::new("bob")),
            Err(TripError::OptionNotFound(_))
        ));
    }

    #[test]
    fn test_close_poll_keeps_votes() {
        let mut hub = hub();
        let poll = hub
            .create_poll("Dinner?", UserId::new("alice"), options())
            .unwrap();
        let option_id = poll.options[0].id.clone();
        hub.toggle_vote(&poll.id, &option_id, &UserId::new("bob"))
            .unwrap();

        hub.close_poll(&poll.id).unwrap();
        let closed = hub.poll(&poll.id).unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.options[0].vote_count(), 1);
    }

    #[test]
    fn test_vote_percent_through_hub() {
        let mut hub = hub();
        let poll = hub
            .create_poll("Dinner?", UserId::new("alice"), options())
            .unwrap();
        let first = poll.options[0].id.clone();
        let second = poll.options[1].id.clone();

        assert_eq!(hub.vote_percent(&poll.id, &first).unwrap(), 0);

        hub.toggle_vote(&poll.id, &first, &UserId::new("a")).unwrap();
        hub.toggle_vote(&poll.id, &second, &UserId::new("b")).unwrap();
        hub.toggle_vote(&poll.id, &second, &UserId::new("c")).unwrap();

        assert_eq!(hub.vote_percent(&poll.id, &first).unwrap(), 33);
        assert_eq!(hub.vote_percent(&poll.id, &second).unwrap(), 67);
    }

    #[test]
    fn test_photo_defaults_differ_by_linkage() {
        let mut hub = hub();
        let linked = hub.add_photo(
            UserId::new("alice"),
            "ref-1",
            Some(ItineraryItemId::new("item-1")),
            "Tokyo, Japan",
        );
        assert_eq!(linked.caption.as_deref(), Some(LINKED_PHOTO_CAPTION));
        assert!(linked.location.is_none());

        let loose = hub.add_photo(UserId::new("alice"), "ref-2", None, "Tokyo, Japan");
        assert_eq!(loose.caption.as_deref(), Some(LOOSE_PHOTO_CAPTION));
        assert_eq!(loose.location.as_deref(), Some("Tokyo, Japan"));
    }

    #[test]
    fn test_feed_is_newest_first() {
        let mut hub = hub();
        hub.add_photo(UserId::new("alice"), "ref-1", None, "Tokyo");
        hub.add_photo(UserId::new("alice"), "ref-2", None, "Tokyo");

        let feed: Vec<_> = hub.feed().iter().map(|photo| photo.url.as_str()).collect();
        assert_eq!(feed, vec!["ref-2", "ref-1"]);
    }

    #[test]
    fn test_set_tags_replaces_wholesale() {
        let mut hub = hub();
        let photo = hub.add_photo(UserId::new("alice"), "ref-1", None, "Tokyo");

        let mut first = BTreeSet::new();
        first.insert(UserId::new("bob"));
        first.insert(UserId::new("carol"));
        hub.set_tags(&photo.id, first).unwrap();

        let mut second = BTreeSet::new();
        second.insert(UserId::new("dave"));
        let updated = hub.set_tags(&photo.id, second).unwrap();

        assert!(updated.is_tagged(&UserId::new("dave")));
        assert!(!updated.is_tagged(&UserId::new("bob")));
    }

    #[test]
    fn test_linked_item_title_tolerates_dangling_links() {
        let mut hub = hub();
        let mut itinerary = ItineraryStore::new(TripId::new("trip-1"));
        let item = itinerary
            .add(ItineraryDraft::new(
                ItineraryKind::Food,
                "Dinner",
                clock::parse_datetime("2024-06-01T19:00").unwrap(),
            ))
            .unwrap();

        let photo = hub.add_photo(
            UserId::new("alice"),
            "ref-1",
            Some(item.id.clone()),
            "Tokyo",
        );
        assert_eq!(
            hub.linked_item_title(&photo.id, &itinerary),
            Some("Dinner")
        );

        itinerary.remove(&item.id).unwrap();
        assert_eq!(hub.linked_item_title(&photo.id, &itinerary), None);
    }

    #[test]
    fn test_notifications_prepend_unread_and_clear_in_bulk() {
        let mut hub = hub();
        hub.notify(NotificationKind::Photo, "Alice added a new photo");
        hub.notify_with_related(NotificationKind::Poll, "A new poll has been created!", "p-1");

        assert_eq!(hub.unread_count(), 2);
        assert_eq!(hub.notifications()[0].kind, NotificationKind::Poll);
        assert_eq!(hub.notifications()[0].related_id.as_deref(), Some("p-1"));

        hub.mark_all_read();
        assert_eq!(hub.unread_count(), 0);

        hub.notify(NotificationKind::Tag, "Alice tagged friends in a photo");
        assert_eq!(hub.unread_count(), 1);
    }

    #[test]
    fn test_announcements_pin_newest_first() {
        let mut hub = hub();
        hub.post_announcement(Announcement::system("Welcome to Tokyo! Join code: ABC123"));
        hub.post_announcement(Announcement::new(UserId::new("alice"), "Dinner at 7"));

        assert_eq!(hub.announcements().len(), 2);
        assert_eq!(hub.announcements()[0].text, "Dinner at 7");
    }
}
