use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Inference Gateway Types
// =============================================================================

/// Externally configured content-safety policy attached to inference calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationPolicy {
    pub identifier: String,
    pub version: String,
}

impl ModerationPolicy {
    /// A policy is only active when both the identifier and version are set.
    pub fn from_parts(identifier: Option<&str>, version: Option<&str>) -> Option<Self> {
        match (identifier, version) {
            (Some(id), Some(ver)) if !id.is_empty() && !ver.is_empty() => Some(Self {
                identifier: id.to_string(),
                version: ver.to_string(),
            }),
            _ => None,
        }
    }
}

/// A single call to the generative backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// System instructions, if any.
    pub system: Option<String>,
    /// User-facing prompt text.
    pub prompt: String,
    /// Opaque audio payload for speech-capable models.
    pub audio: Option<String>,
    pub moderation: Option<ModerationPolicy>,
    pub max_tokens: Option<u32>,
}

impl InferenceRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_moderation(mut self, policy: Option<ModerationPolicy>) -> Self {
        self.moderation = policy;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Complete response from the generative backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub content: String,
    pub stop_reason: String,
}

impl InferenceResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stop_reason: "stop".into(),
        }
    }
}

/// Partial text chunks of a streamed response.
pub type ChunkStream = BoxStream<'static, Result<String>>;
