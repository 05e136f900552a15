//! In-trip notifications and announcements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Author id used for automatic system announcements
pub const SYSTEM_AUTHOR: &str = "system";

/// Unique identifier for a notification
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl NotificationId {
    /// Generate a new random NotificationId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a NotificationId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an announcement
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnouncementId(pub String);

impl AnnouncementId {
    /// Generate a new random AnnouncementId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create an AnnouncementId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AnnouncementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of event a notification reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Announcement,
    Poll,
    Photo,
    Tag,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NotificationKind::Announcement => "announcement",
            NotificationKind::Poll => "poll",
            NotificationKind::Photo => "photo",
            NotificationKind::Tag => "tag",
        };
        write!(f, "{label}")
    }
}

/// A per-member activity notice, newest kept first by the hub
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    /// Id of the poll, photo, or announcement this points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::generate(),
            kind,
            message: message.into(),
            related_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_related_id(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }
}

/// A broadcast message pinned into the trip feed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub author: UserId,
    pub text: String,
    /// None broadcasts to every member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_ids: Option<Vec<UserId>>,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(author: UserId, text: impl Into<String>) -> Self {
        Self {
            id: AnnouncementId::generate(),
            author,
            text: text.into(),
            target_user_ids: None,
            is_important: false,
            created_at: Utc::now(),
        }
    }

    /// Automatic announcement authored by the system
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(UserId::new(SYSTEM_AUTHOR), text)
    }

    pub fn important(mut self) -> Self {
        self.is_important = true;
        self
    }

    pub fn with_targets(mut self, targets: Vec<UserId>) -> Self {
        self.target_user_ids = Some(targets);
        self
    }

    /// Whether this announcement should be shown to a member
    pub fn is_for(&self, member: &UserId) -> bool {
        match &self.target_user_ids {
            Some(targets) => targets.contains(member),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_start_unread() {
        let notification = Notification::new(NotificationKind::Photo, "Alice added a new photo");
        assert!(!notification.is_read);
        assert!(notification.related_id.is_none());
    }

    #[test]
    fn test_system_announcement() {
        let announcement = Announcement::system("Welcome to Tokyo! Join code: ABC123").important();
        assert_eq!(announcement.author, UserId::new(SYSTEM_AUTHOR));
        assert!(announcement.is_important);
    }

    #[test]
    fn test_targeted_announcement_visibility() {
        let broadcast = Announcement::system("hello");
        assert!(broadcast.is_for(&UserId::new("bob")));

        let targeted = Announcement::system("hello").with_targets(vec![UserId::new("alice")]);
        assert!(targeted.is_for(&UserId::new("alice")));
        assert!(!targeted.is_for(&UserId::new("bob")));
    }
}
