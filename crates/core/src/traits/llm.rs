//! Inference Gateway traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{ChunkStream, InferenceRequest, InferenceResponse};

/// Black-box access to the generative backend.
///
/// Implementations attach `request.moderation` to the backend call when it is
/// set and report a policy veto as [`crate::Error::ModerationIntervention`].
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Generate a complete response.
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse>;

    /// Open a streamed response.
    ///
    /// Dropping the returned stream cancels the upstream call.
    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream>;
}

#[async_trait]
impl<G: InferenceGateway + ?Sized> InferenceGateway for Arc<G> {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        (**self).complete(request).await
    }

    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream> {
        (**self).stream(request).await
    }
}
