//! Gemini Provider Adapter
//!
//! Implements Roam's generative capability traits against Google's
//! Gemini and Veo models. All provider traffic goes through the
//! [`GeminiTransport`] trait so the rest of the system stays testable
//! offline; the bundled [`NoopTransport`] fails every call with a
//! transport error until a real transport is plugged in.
//!
//! Model output is untrusted. Every JSON payload is validated against
//! an explicit envelope here, with a single repair pass that slices
//! the first JSON value out of prose-wrapped responses. Awards degrade
//! to an empty list when nothing parses; quiz payloads that fail
//! validation are reported as invalid responses.

#![deny(unsafe_code)]

use std::sync::Arc;

use async_trait::async_trait;
use roam_capability::{
    AlteredImage, AwardsContext, Capability, CapabilityError, CapabilityErrorKind, GenerativeText,
    GenerativeVideo, ImageData, ImageDiff, PlaceLookup, QuizSheet, VideoOperation, VideoRequest,
};
use roam_types::Award;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Text and JSON generation model
pub const TEXT_MODEL: &str = "gemini-2.5-flash";
/// Image editing model used by the memory game
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Long-running video generation model
pub const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Environment variable consulted for the billed API key
pub const AUTH_ENV_VAR: &str = "GEMINI_API_KEY";

/// Instruction used to alter photos for the memory game
pub const MEMORY_EDIT_INSTRUCTION: &str =
    "Add a colorful parrot sitting somewhere in this scene naturally.";

/// Prompt used when a video request arrives with a blank prompt
pub const DEFAULT_VIDEO_PROMPT: &str = "A cinematic travel montage of a beautiful journey.";

/// Text generation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Set to "application/json" when structured output is expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Ground the answer with the provider's maps tool
    #[serde(default)]
    pub maps_grounding: bool,
}

/// Raw text payload returned by the provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub output_text: String,
}

/// Image edit request: source image plus instruction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditImageRequest {
    pub model: String,
    pub image_base64: String,
    pub mime: String,
    pub instruction: String,
}

/// Edited image payload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditImageResponse {
    pub image_base64: String,
    pub mime: String,
}

/// Video job submission
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartVideoRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_image: Option<String>,
    pub resolution: String,
    pub aspect_ratio: String,
}

/// Provider-side state of a video job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoStatus {
    pub operation_id: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_uri: Option<String>,
}

/// Wire transport to the Gemini API
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateRequest,
        api_key: &str,
    ) -> Result<GenerateResponse, CapabilityError>;

    async fn edit_image(
        &self,
        request: &EditImageRequest,
        api_key: &str,
    ) -> Result<EditImageResponse, CapabilityError>;

    async fn start_video(
        &self,
        request: &StartVideoRequest,
        api_key: &str,
    ) -> Result<VideoStatus, CapabilityError>;

    async fn poll_video(
        &self,
        operation_id: &str,
        api_key: &str,
    ) -> Result<VideoStatus, CapabilityError>;
}

/// Default transport that fails every call. Lets the adapter be
/// constructed and wired without network access.
#[derive(Debug, Default, Clone)]
pub struct NoopTransport;

impl NoopTransport {
    fn unavailable(capability: Capability) -> CapabilityError {
        CapabilityError::new(
            capability,
            CapabilityErrorKind::Transport,
            "Gemini transport not implemented",
        )
    }
}

#[async_trait]
impl GeminiTransport for NoopTransport {
    async fn generate(
        &self,
        _request: &GenerateRequest,
        _api_key: &str,
    ) -> Result<GenerateResponse, CapabilityError> {
        Err(Self::unavailable(Capability::GenerativeText))
    }

    async fn edit_image(
        &self,
        _request: &EditImageRequest,
        _api_key: &str,
    ) -> Result<EditImageResponse, CapabilityError> {
        Err(Self::unavailable(Capability::ImageDiff))
    }

    async fn start_video(
        &self,
        _request: &StartVideoRequest,
        _api_key: &str,
    ) -> Result<VideoStatus, CapabilityError> {
        Err(Self::unavailable(Capability::GenerativeVideo))
    }

    async fn poll_video(
        &self,
        _operation_id: &str,
        _api_key: &str,
    ) -> Result<VideoStatus, CapabilityError> {
        Err(Self::unavailable(Capability::GenerativeVideo))
    }
}

/// Model selection and video rendering options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub text_model: String,
    pub image_model: String,
    pub video_model: String,
    pub video_resolution: String,
    pub video_aspect_ratio: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            text_model: TEXT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
            video_model: VIDEO_MODEL.to_string(),
            video_resolution: "720p".to_string(),
            video_aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Gemini-backed implementation of the Roam capability traits
#[derive(Clone)]
pub struct GeminiAdapter {
    config: GeminiConfig,
    api_key: Option<String>,
    transport: Arc<dyn GeminiTransport>,
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("config", &self.config)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiAdapter {
    /// Adapter wired to the no-op transport, without a key
    pub fn new() -> Self {
        Self::with_transport(Arc::new(NoopTransport))
    }

    pub fn with_transport(transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            config: GeminiConfig::default(),
            api_key: None,
            transport,
        }
    }

    pub fn with_config(mut self, config: GeminiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Adapter with the billed key taken from the environment
    pub fn from_env(transport: Arc<dyn GeminiTransport>) -> Result<Self, CapabilityError> {
        let api_key = Self::auth_token_from_env()?;
        Ok(Self::with_transport(transport).with_api_key(api_key))
    }

    /// Read the billed API key from [`AUTH_ENV_VAR`]
    pub fn auth_token_from_env() -> Result<String, CapabilityError> {
        std::env::var(AUTH_ENV_VAR).map_err(|_| {
            CapabilityError::new(
                Capability::GenerativeVideo,
                CapabilityErrorKind::MissingCredential,
                format!("missing {AUTH_ENV_VAR}"),
            )
        })
    }

    /// Key for surfaces that work against the ambient project key
    fn ambient_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Video generation is the one surface that refuses to start
    /// without a billed key
    fn require_api_key(&self) -> Result<&str, CapabilityError> {
        self.api_key.as_deref().ok_or_else(|| {
            CapabilityError::new(
                Capability::GenerativeVideo,
                CapabilityErrorKind::MissingCredential,
                format!("missing {AUTH_ENV_VAR}"),
            )
        })
    }

    fn video_operation(&self, status: VideoStatus, api_key: &str) -> VideoOperation {
        // Playback of the returned URI is authenticated by key param
        let media_ref = status
            .media_uri
            .map(|uri| format!("{uri}&key={api_key}"));
        VideoOperation {
            id: status.operation_id,
            done: status.done,
            media_ref,
        }
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeText for GeminiAdapter {
    async fn summarize_awards(
        &self,
        context: &AwardsContext,
    ) -> Result<Vec<Award>, CapabilityError> {
        let request = GenerateRequest {
            model: self.config.text_model.clone(),
            prompt: awards_prompt(context),
            response_mime_type: Some("application/json".to_string()),
            maps_grounding: false,
        };
        let response = self
            .transport
            .generate(&request, self.ambient_key())
            .await
            .map_err(|err| err.with_capability(Capability::GenerativeText))?;
        Ok(parse_awards(&response.output_text))
    }
}

#[async_trait]
impl PlaceLookup for GeminiAdapter {
    async fn resolve(&self, query: &str) -> Result<Option<String>, CapabilityError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let request = GenerateRequest {
            model: self.config.text_model.clone(),
            prompt: format!(
                "Find the precise location for: \"{query}\". Return ONLY the Name and \
                 Address in a single line. Do not add any conversational text."
            ),
            response_mime_type: None,
            maps_grounding: true,
        };
        // Lookup is a convenience; any failure reads as "no match"
        match self.transport.generate(&request, self.ambient_key()).await {
            Ok(response) => {
                let line = response.output_text.trim();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line.to_string()))
                }
            }
            Err(err) => {
                warn!(error = %err, "Place lookup failed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ImageDiff for GeminiAdapter {
    async fn alter(&self, image: &ImageData) -> Result<AlteredImage, CapabilityError> {
        let request = EditImageRequest {
            model: self.config.image_model.clone(),
            image_base64: image.base64.clone(),
            mime: image.mime.clone(),
            instruction: MEMORY_EDIT_INSTRUCTION.to_string(),
        };
        let response = self
            .transport
            .edit_image(&request, self.ambient_key())
            .await
            .map_err(|err| err.with_capability(Capability::ImageDiff))?;
        if response.image_base64.trim().is_empty() {
            return Err(CapabilityError::new(
                Capability::ImageDiff,
                CapabilityErrorKind::InvalidResponse,
                "image edit returned no image data",
            ));
        }
        Ok(AlteredImage {
            image: ImageData::new(response.image_base64, response.mime),
            description: MEMORY_EDIT_INSTRUCTION.to_string(),
        })
    }

    async fn quiz(&self, description: &str) -> Result<QuizSheet, CapabilityError> {
        let request = GenerateRequest {
            model: self.config.text_model.clone(),
            prompt: quiz_prompt(description),
            response_mime_type: Some("application/json".to_string()),
            maps_grounding: false,
        };
        let response = self
            .transport
            .generate(&request, self.ambient_key())
            .await
            .map_err(|err| err.with_capability(Capability::ImageDiff))?;
        parse_quiz(&response.output_text).ok_or_else(|| {
            CapabilityError::new(
                Capability::ImageDiff,
                CapabilityErrorKind::InvalidResponse,
                "quiz payload failed schema validation",
            )
        })
    }
}

#[async_trait]
impl GenerativeVideo for GeminiAdapter {
    async fn start_recap_video(
        &self,
        request: &VideoRequest,
    ) -> Result<VideoOperation, CapabilityError> {
        let api_key = self.require_api_key()?.to_string();
        let prompt = if request.prompt.trim().is_empty() {
            DEFAULT_VIDEO_PROMPT.to_string()
        } else {
            request.prompt.clone()
        };
        let start = StartVideoRequest {
            model: self.config.video_model.clone(),
            prompt,
            seed_image: request.seed_image.clone(),
            resolution: self.config.video_resolution.clone(),
            aspect_ratio: self.config.video_aspect_ratio.clone(),
        };
        let status = self
            .transport
            .start_video(&start, &api_key)
            .await
            .map_err(|err| err.with_capability(Capability::GenerativeVideo))?;
        Ok(self.video_operation(status, &api_key))
    }

    async fn poll_recap_video(
        &self,
        operation: &VideoOperation,
    ) -> Result<VideoOperation, CapabilityError> {
        let api_key = self.require_api_key()?.to_string();
        let status = self
            .transport
            .poll_video(&operation.id, &api_key)
            .await
            .map_err(|err| err.with_capability(Capability::GenerativeVideo))?;
        Ok(self.video_operation(status, &api_key))
    }
}

/// Expected shape of one award entry in the model's JSON array
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AwardEnvelope {
    #[serde(default)]
    title: String,
    #[serde(default)]
    winner_name: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    icon: String,
}

/// Expected shape of the quiz JSON object
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizEnvelope {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: String,
}

fn awards_prompt(context: &AwardsContext) -> String {
    let names: Vec<&str> = context
        .members
        .iter()
        .map(|member| member.name.as_str())
        .collect();
    let questions: Vec<&str> = context
        .poll_questions
        .iter()
        .map(String::as_str)
        .collect();

    let mut stats_summary = String::from("User Statistics:\n");
    for member in &context.members {
        match member.stats {
            Some(stats) => stats_summary.push_str(&format!(
                "{} -> Edits: {}, Views: {}, App Opens: {}, Photos: {}, Votes: {}\n",
                member.name,
                stats.itinerary_edits,
                stats.itinerary_views,
                stats.trip_opens,
                stats.photos_added,
                stats.votes_cast,
            )),
            None => stats_summary.push_str(&format!("{}: No data\n", member.name)),
        }
    }

    format!(
        "Users: {}. Photos taken: {}. Polls created: {}. Poll content: {}.\n\
         {}\n\
         Based on the provided trip data and user statistics, create 3 fun and distinct awards.\n\
         CRITICAL: You MUST use the \"User Statistics\" numbers to determine the winners logically.\n\
         1. Look for the user with the most 'Edits' or 'Views' to give an award like \"The Planner\" or \"The micromanager\".\n\
         2. Look for the user with the most 'Photos' for \"Paparazzi\" or similar.\n\
         3. Look for the user with the most 'App Opens' or 'Votes' for \"Most Excited\" or \"The Decider\".\n\
         If statistics are tied or 0, be creative based on the general vibe.\n\
         Return JSON array.",
        names.join(", "),
        context.photo_count,
        context.poll_questions.len(),
        questions.join("; "),
        stats_summary,
    )
}

fn quiz_prompt(description: &str) -> String {
    format!(
        "I edited a photo to: {description}. Generate a JSON object for a quiz.\n\
         {{\n\
           \"question\": \"What changed in the photo?\",\n\
           \"options\": [\"wrong answer 1\", \"wrong answer 2\", \"correct answer\"],\n\
           \"correctAnswer\": \"correct answer\"\n\
         }}"
    )
}

/// Parse the model's award array, falling back to an empty list.
/// Entries without a title or winner are dropped rather than shown
/// half-filled.
fn parse_awards(raw: &str) -> Vec<Award> {
    let parsed = serde_json::from_str::<Vec<AwardEnvelope>>(raw).ok().or_else(|| {
        extract_first_json_array(raw).and_then(|slice| serde_json::from_str(slice).ok())
    });
    let Some(entries) = parsed else {
        warn!("Discarding unparseable awards payload");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter(|entry| {
            !entry.title.trim().is_empty() && !entry.winner_name.trim().is_empty()
        })
        .map(|entry| Award {
            title: entry.title,
            winner_name: entry.winner_name,
            reason: entry.reason,
            icon: entry.icon,
        })
        .collect()
}

/// Validate the quiz payload; None when it fails the schema
fn parse_quiz(raw: &str) -> Option<QuizSheet> {
    let envelope = serde_json::from_str::<QuizEnvelope>(raw).ok().or_else(|| {
        extract_first_json_object(raw).and_then(|slice| serde_json::from_str(slice).ok())
    })?;
    if envelope.options.is_empty() || envelope.correct_answer.trim().is_empty() {
        return None;
    }
    Some(QuizSheet {
        options: envelope.options,
        correct_answer: envelope.correct_answer,
    })
}

fn extract_first_json_array(raw: &str) -> Option<&str> {
    extract_first_delimited(raw, '[', ']')
}

fn extract_first_json_object(raw: &str) -> Option<&str> {
    extract_first_delimited(raw, '{', '}')
}

/// Slice the first balanced JSON value out of prose-wrapped output,
/// respecting string literals and escapes
fn extract_first_delimited(raw: &str, open: char, close: char) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => {
                if depth == 0 {
                    start = Some(offset);
                }
                depth += 1;
            }
            c if c == close && !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start?..offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
