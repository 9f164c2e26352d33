//! Deadline wrapper for inference backends.

use async_trait::async_trait;
use std::time::Duration;

use contact_router_core::{
    traits::InferenceGateway,
    types::{ChunkStream, InferenceRequest, InferenceResponse},
    Error, Result,
};

/// Bounds every backend call by a fixed deadline.
///
/// For streams only opening the stream is bounded; chunk pacing is the
/// consumer's concern.
pub struct TimeoutGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G: InferenceGateway> TimeoutGateway<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<G: InferenceGateway> InferenceGateway for TimeoutGateway<G> {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Inference call timed out");
                Err(Error::Timeout(format!(
                    "inference call exceeded {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream> {
        match tokio::time::timeout(self.timeout, self.inner.stream(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "opening inference stream exceeded {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_router_core::mocks::{MockReply, ScriptedGateway};

    #[tokio::test(start_paused = true)]
    async fn test_hanging_backend_times_out() {
        let gateway = TimeoutGateway::new(
            ScriptedGateway::new().then(MockReply::Hang),
            Duration::from_millis(500),
        );

        let err = gateway
            .complete(&InferenceRequest::prompt("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fast_backend_passes_through() {
        let gateway = TimeoutGateway::new(ScriptedGateway::constant("Sales"), Duration::from_secs(5));

        let resp = gateway.complete(&InferenceRequest::prompt("hello")).await.unwrap();
        assert_eq!(resp.content, "Sales");
    }
}
