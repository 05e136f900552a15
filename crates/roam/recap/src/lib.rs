//! Roam Recap Service
//!
//! Builds the end-of-trip surfaces from frozen trip data: the award
//! set, the generated highlight video, and the photo memory game. All
//! generative work goes through the capability traits; the service
//! composes results and never mutates trip state, so a failed recap
//! costs the group a feature, not their plans.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use roam_capability::{
    AwardsContext, Capability, CapabilityError, CapabilityErrorKind, GenerativeText,
    GenerativeVideo, ImageData, ImageDiff, MemberEngagement, VideoRequest,
};
use roam_types::{Award, MemoryChallenge, Photo, Poll, Trip};
use tracing::info;

/// How often a pending video job is re-polled
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Prompt for the end-of-trip highlight video
pub const RECAP_VIDEO_PROMPT: &str =
    "A nostalgic video montage of a group travel adventure with friends, scenic views, and laughter.";

/// Tuning for recap generation
#[derive(Clone, Debug)]
pub struct RecapConfig {
    pub poll_interval: Duration,
    pub video_prompt: String,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            video_prompt: RECAP_VIDEO_PROMPT.to_string(),
        }
    }
}

/// Orchestrates the generative recap features for ended trips
#[derive(Clone)]
pub struct RecapService {
    text: Arc<dyn GenerativeText>,
    video: Arc<dyn GenerativeVideo>,
    image_diff: Arc<dyn ImageDiff>,
    config: RecapConfig,
}

impl std::fmt::Debug for RecapService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecapService")
            .field("config", &self.config)
            .finish()
    }
}

/// Snapshot the trip narrative for award generation. Members without
/// recorded stats are kept and marked as such; the generator handles
/// them explicitly.
pub fn awards_context(trip: &Trip, photos: &[Photo], polls: &[Poll]) -> AwardsContext {
    AwardsContext {
        members: trip
            .members
            .iter()
            .map(|user| MemberEngagement {
                name: user.name.clone(),
                stats: trip.stats.get(&user.id).copied(),
            })
            .collect(),
        photo_count: photos.len(),
        poll_questions: polls.iter().map(|poll| poll.question.clone()).collect(),
    }
}

impl RecapService {
    pub fn new(
        text: Arc<dyn GenerativeText>,
        video: Arc<dyn GenerativeVideo>,
        image_diff: Arc<dyn ImageDiff>,
    ) -> Self {
        Self {
            text,
            video,
            image_diff,
            config: RecapConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RecapConfig) -> Self {
        self.config = config;
        self
    }

    /// Generate the award set; an empty list is a valid outcome
    pub async fn awards(&self, context: &AwardsContext) -> Result<Vec<Award>, CapabilityError> {
        let awards = self.text.summarize_awards(context).await?;
        info!(count = awards.len(), "Recap awards generated");
        Ok(awards)
    }

    /// Start the highlight video and wait for the final media
    /// reference, re-polling at the configured interval.
    ///
    /// A job that stays pending is a loading condition, not an error:
    /// this future keeps polling until the provider reports done.
    pub async fn render_video(&self, photos: &[Photo]) -> Result<String, CapabilityError> {
        let mut request = VideoRequest::new(self.config.video_prompt.clone());
        if let Some(seed) = photos.first().and_then(|photo| ImageData::from_data_reference(&photo.url)) {
            request = request.with_seed_image(seed.base64);
        }

        let mut operation = self.video.start_recap_video(&request).await?;
        info!(operation = %operation.id, "Recap video started");

        while !operation.done {
            tokio::time::sleep(self.config.poll_interval).await;
            operation = self.video.poll_recap_video(&operation).await?;
        }

        info!(operation = %operation.id, "Recap video finished");
        operation.media_ref.ok_or_else(|| {
            CapabilityError::new(
                Capability::GenerativeVideo,
                CapabilityErrorKind::InvalidResponse,
                "video job finished without a media reference",
            )
        })
    }

    /// Build one round of the photo memory game: alter the photo,
    /// then quiz on what changed
    pub async fn memory_challenge(&self, photo: &Photo) -> Result<MemoryChallenge, CapabilityError> {
        let Some(original) = ImageData::from_data_reference(&photo.url) else {
            return Err(CapabilityError::new(
                Capability::ImageDiff,
                CapabilityErrorKind::InvalidResponse,
                "photo is not an inline data reference",
            ));
        };

        let altered = self.image_diff.alter(&original).await?;
        let quiz = self.image_diff.quiz(&altered.description).await?;

        Ok(MemoryChallenge {
            original_image: original.base64,
            altered_image: altered.image.base64,
            diff_description: altered.description,
            options: quiz.options,
            correct_answer: quiz.correct_answer,
        })
    }
}
