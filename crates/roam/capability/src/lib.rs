//! Roam Capability Boundary
//!
//! The planning core consumes external collaborators (media storage,
//! generative text and video, place lookup, image diffing) through the
//! traits in this crate. Provider crates implement them; the core
//! never names a provider.
//!
//! # Key Principle
//!
//! Every failure crosses this boundary as a typed [`CapabilityError`].
//! A failed collaborator call may cost the caller a feature, never its
//! state.

#![deny(unsafe_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use roam_types::{Award, UserStats};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which collaborator produced an error
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    BlobStore,
    GenerativeText,
    GenerativeVideo,
    PlaceLookup,
    ImageDiff,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Capability::BlobStore => "blob_store",
            Capability::GenerativeText => "generative_text",
            Capability::GenerativeVideo => "generative_video",
            Capability::PlaceLookup => "place_lookup",
            Capability::ImageDiff => "image_diff",
        };
        write!(f, "{label}")
    }
}

/// Failure classes at the collaborator boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityErrorKind {
    /// Network or provider plumbing failed
    Transport,
    /// The credential the provider needs is absent
    MissingCredential,
    /// The provider answered with something that failed validation
    InvalidResponse,
    /// The capability is not available in this build or configuration
    Unavailable,
}

/// Typed failure from an external collaborator
#[derive(Debug, Clone, Error)]
#[error("{capability} capability failed ({kind:?}): {message}")]
pub struct CapabilityError {
    pub capability: Capability,
    pub kind: CapabilityErrorKind,
    pub message: String,
}

impl CapabilityError {
    pub fn new(
        capability: Capability,
        kind: CapabilityErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            capability,
            kind,
            message: message.into(),
        }
    }

    /// Re-attribute an error to the capability surface that was being
    /// served when it happened
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    /// Missing credentials are surfaced to the user distinctly from
    /// transient failures
    pub fn is_missing_credential(&self) -> bool {
        matches!(self.kind, CapabilityErrorKind::MissingCredential)
    }
}

/// Raw bytes plus MIME type handed in from an upload boundary
#[derive(Clone, Serialize, Deserialize)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

impl std::fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBlob")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Base64 image payload exchanged with generative collaborators
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub base64: String,
    pub mime: String,
}

impl ImageData {
    pub fn new(base64: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime: mime.into(),
        }
    }

    /// Split a `data:` reference into its payload. Remote references
    /// return None; they cannot seed the generative collaborators.
    pub fn from_data_reference(reference: &str) -> Option<Self> {
        let rest = reference.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some(Self {
            base64: payload.to_string(),
            mime: mime.to_string(),
        })
    }

    /// Render back into a `data:` reference
    pub fn to_data_reference(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Per-member engagement line for award generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberEngagement {
    pub name: String,
    /// None when the member never performed a counted action
    pub stats: Option<UserStats>,
}

/// Frozen trip narrative handed to award generation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AwardsContext {
    pub members: Vec<MemberEngagement>,
    pub photo_count: usize,
    pub poll_questions: Vec<String>,
}

/// Video job request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoRequest {
    pub prompt: String,
    /// Base64 frame used to anchor the montage, usually the first
    /// trip photo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_image: Option<String>,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            seed_image: None,
        }
    }

    pub fn with_seed_image(mut self, seed_image: impl Into<String>) -> Self {
        self.seed_image = Some(seed_image.into());
        self
    }
}

/// Handle on a long-running video job, polled until done
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOperation {
    pub id: String,
    pub done: bool,
    /// Playable media reference, present once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
}

impl VideoOperation {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: false,
            media_ref: None,
        }
    }

    pub fn finished(id: impl Into<String>, media_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: true,
            media_ref: Some(media_ref.into()),
        }
    }
}

/// An edited image plus a description of what changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlteredImage {
    pub image: ImageData,
    pub description: String,
}

/// Quiz sheet built from an image alteration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSheet {
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Upload boundary: turns raw bytes into an opaque reference the data
/// model can carry
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read_as_data_reference(&self, blob: MediaBlob) -> Result<String, CapabilityError>;
}

/// Award generation from the frozen trip narrative
#[async_trait]
pub trait GenerativeText: Send + Sync {
    /// Providers degrade malformed output to an empty award list;
    /// transport failures surface as errors
    async fn summarize_awards(
        &self,
        context: &AwardsContext,
    ) -> Result<Vec<Award>, CapabilityError>;
}

/// Long-running recap video jobs
#[async_trait]
pub trait GenerativeVideo: Send + Sync {
    async fn start_recap_video(
        &self,
        request: &VideoRequest,
    ) -> Result<VideoOperation, CapabilityError>;

    async fn poll_recap_video(
        &self,
        operation: &VideoOperation,
    ) -> Result<VideoOperation, CapabilityError>;
}

/// Free-text place resolution
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Canonical single-line "Name and Address", or None when the
    /// query cannot be resolved
    async fn resolve(&self, query: &str) -> Result<Option<String>, CapabilityError>;
}

/// Image alteration and quiz generation for the photo memory game
#[async_trait]
pub trait ImageDiff: Send + Sync {
    async fn alter(&self, image: &ImageData) -> Result<AlteredImage, CapabilityError>;

    async fn quiz(&self, description: &str) -> Result<QuizSheet, CapabilityError>;
}

/// Default in-process blob store. Encodes bytes as a base64 `data:`
/// reference, the same shape a browser file reader hands over.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore;

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn read_as_data_reference(&self, blob: MediaBlob) -> Result<String, CapabilityError> {
        if blob.mime.trim().is_empty() {
            return Err(CapabilityError::new(
                Capability::BlobStore,
                CapabilityErrorKind::InvalidResponse,
                "blob is missing a MIME type",
            ));
        }
        let encoded = BASE64.encode(&blob.bytes);
        Ok(format!("data:{};base64,{}", blob.mime, encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blob_store_produces_data_reference() {
        let store = InMemoryBlobStore;
        let reference = store
            .read_as_data_reference(MediaBlob::jpeg(vec![0xFF, 0xD8, 0xFF]))
            .await
            .unwrap();

        assert!(reference.starts_with("data:image/jpeg;base64,"));
        let image = ImageData::from_data_reference(&reference).unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.to_data_reference(), reference);
    }

    #[tokio::test]
    async fn test_blob_store_rejects_missing_mime() {
        let store = InMemoryBlobStore;
        let result = store
            .read_as_data_reference(MediaBlob::new(vec![1, 2, 3], " "))
            .await;
        assert!(matches!(
            result,
            Err(CapabilityError {
                kind: CapabilityErrorKind::InvalidResponse,
                ..
            })
        ));
    }

    #[test]
    fn test_image_data_rejects_remote_references() {
        assert!(ImageData::from_data_reference("https://example.com/a.jpg").is_none());
        assert!(ImageData::from_data_reference("data:image/png,raw").is_none());
    }

    #[test]
    fn test_error_attribution() {
        let err = CapabilityError::new(
            Capability::GenerativeText,
            CapabilityErrorKind::Transport,
            "socket closed",
        )
        .with_capability(Capability::PlaceLookup);

        assert_eq!(err.capability, Capability::PlaceLookup);
        assert!(!err.is_missing_credential());
        assert!(err.to_string().contains("place_lookup"));
    }

    #[test]
    fn test_video_operation_constructors() {
        let pending = VideoOperation::pending("op-1");
        assert!(!pending.done);
        assert!(pending.media_ref.is_none());

        let finished = VideoOperation::finished("op-1", "https://cdn/video.mp4");
        assert!(finished.done);
        assert_eq!(finished.media_ref.as_deref(), Some("https://cdn/video.mp4"));
    }
}
