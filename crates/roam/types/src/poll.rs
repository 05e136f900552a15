//! Group decision polls.
//!
//! Votes are explicit member-id sets per option. A member may vote on
//! several options of the same poll; each vote toggles independently.
//! Derived tallies are computed from the sets, never stored.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Unique identifier for a poll
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollId(pub String);

impl PollId {
    /// Generate a new random PollId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a PollId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PollId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one option within a poll
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollOptionId(pub String);

impl PollOptionId {
    /// Generate a new random PollOptionId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a PollOptionId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PollOptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a vote toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteToggle {
    /// The member's vote was added
    Cast,
    /// The member's existing vote was removed
    Retracted,
}

impl VoteToggle {
    pub fn is_cast(&self) -> bool {
        matches!(self, VoteToggle::Cast)
    }
}

/// Fields for creating a poll option
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollOptionDraft {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PollOptionDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// One choice within a poll
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollOption {
    pub id: PollOptionId,
    pub text: String,
    /// Members currently voting for this option
    pub votes: BTreeSet<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PollOption {
    pub fn new(draft: PollOptionDraft) -> Self {
        Self {
            id: PollOptionId::generate(),
            text: draft.text,
            votes: BTreeSet::new(),
            image_url: draft.image_url,
        }
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn has_vote(&self, member: &UserId) -> bool {
        self.votes.contains(member)
    }

    /// Flip the member's vote on this option
    pub fn toggle(&mut self, member: &UserId) -> VoteToggle {
        if self.votes.remove(member) {
            VoteToggle::Retracted
        } else {
            self.votes.insert(member.clone());
            VoteToggle::Cast
        }
    }
}

/// A group decision poll
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub created_by: UserId,
    pub options: Vec<PollOption>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Build an open poll from option drafts
    pub fn new(
        question: impl Into<String>,
        created_by: UserId,
        options: Vec<PollOptionDraft>,
    ) -> Self {
        Self {
            id: PollId::generate(),
            question: question.into(),
            created_by,
            options: options.into_iter().map(PollOption::new).collect(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn option(&self, id: &PollOptionId) -> Option<&PollOption> {
        self.options.iter().find(|option| &option.id == id)
    }

    pub fn option_mut(&mut self, id: &PollOptionId) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|option| &option.id == id)
    }

    /// Votes across all options; multi-votes count once per option
    pub fn total_votes(&self) -> usize {
        self.options.iter().map(PollOption::vote_count).sum()
    }

    /// Display percentage for one option, rounded to the nearest whole
    /// number. A poll with no votes reads 0 everywhere.
    pub fn vote_percent(&self, option_id: &PollOptionId) -> Option<u32> {
        let option = self.option(option_id)?;
        let total = self.total_votes();
        if total == 0 {
            return Some(0);
        }
        Some(((option.vote_count() as f64 / total as f64) * 100.0).round() as u32)
    }
}
