//! Voice path router.
//!
//! Consumes the backend's streamed output chunk by chunk and stops at the
//! first control signal. Dropping the stream cancels the upstream call, so
//! nothing past a terminal signal is read.

use futures::StreamExt;
use std::sync::Arc;

use contact_router_core::{
    traits::{InferenceGateway, ModerationDetector},
    types::{
        ChunkStream, DestinationCatalog, InferenceRequest, StreamOutcome, StreamSignal,
        VoiceTurnRequest, VoiceTurnResponse,
    },
};

use crate::handover::HandoverScanner;
use crate::prompt::voice_system_prompt;
use crate::RouterSettings;

/// Streaming handover and moderation state machine.
pub struct StreamRouter {
    catalog: Arc<DestinationCatalog>,
    gateway: Arc<dyn InferenceGateway>,
    detector: Arc<dyn ModerationDetector>,
    settings: RouterSettings,
}

impl StreamRouter {
    pub fn new(
        catalog: Arc<DestinationCatalog>,
        gateway: Arc<dyn InferenceGateway>,
        detector: Arc<dyn ModerationDetector>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            catalog,
            gateway,
            detector,
            settings,
        }
    }

    /// Open a stream for the turn's audio and map its outcome to a response.
    pub async fn handle(&self, request: &VoiceTurnRequest) -> VoiceTurnResponse {
        let inference = InferenceRequest::prompt("")
            .with_system(voice_system_prompt(&self.catalog, &self.settings.locale))
            .with_audio(request.audio_chunk.clone())
            .with_moderation(self.settings.moderation.clone());

        let outcome = match self.gateway.stream(&inference).await {
            Ok(stream) => self.run(stream).await,
            Err(e) if e.is_moderation() => {
                tracing::warn!(error = %e, "Stream refused by moderation policy");
                StreamOutcome::Blocked
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to open inference stream");
                StreamOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        contact_router_governance::track_stream_outcome(outcome.kind());
        outcome.into()
    }

    /// Consume `stream` until a terminal signal or exhaustion.
    pub async fn run(&self, mut stream: ChunkStream) -> StreamOutcome {
        let mut scanner = HandoverScanner::new(self.detector.clone());
        let idle = self.settings.stream_idle_timeout;
        let mut chunks = 0usize;

        loop {
            let chunk = match tokio::time::timeout(idle, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) if e.is_moderation() => {
                    tracing::warn!(chunks, error = %e, "Stream vetoed by moderation policy");
                    return StreamOutcome::Blocked;
                }
                Ok(Some(Err(e))) => {
                    tracing::error!(chunks, error = %e, "Inference stream failed");
                    return StreamOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
                Ok(None) => {
                    tracing::debug!(chunks, "Stream completed without a control signal");
                    return StreamOutcome::Completed;
                }
                Err(_) => {
                    tracing::error!(chunks, idle_ms = idle.as_millis() as u64, "Inference stream stalled");
                    return StreamOutcome::Failed {
                        reason: format!("no chunk within {}ms", idle.as_millis()),
                    };
                }
            };
            chunks += 1;

            match scanner.push(&chunk) {
                StreamSignal::Continue => continue,
                StreamSignal::ModerationBlocked => {
                    tracing::warn!(chunks, "Content blocked by moderation policy");
                    return StreamOutcome::Blocked;
                }
                StreamSignal::HandoverRequested { destination_name } => {
                    return self.transfer(destination_name);
                }
            }
        }
    }

    fn transfer(&self, destination_name: String) -> StreamOutcome {
        let routing_id = self
            .catalog
            .resolve_with_fallback(&destination_name)
            .map(str::to_string);

        match &routing_id {
            Some(id) => tracing::info!(
                destination = %destination_name,
                routing_id = %id,
                "Handover requested"
            ),
            None => tracing::warn!(
                destination = %destination_name,
                "Handover requested but the catalog is empty"
            ),
        }

        StreamOutcome::Transfer {
            destination_name,
            routing_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handover::MarkerModerationDetector;
    use contact_router_core::mocks::ScriptedGateway;
    use contact_router_core::Error;
    use std::time::Duration;

    fn router_with(catalog: DestinationCatalog, gateway: Arc<ScriptedGateway>) -> StreamRouter {
        StreamRouter::new(
            Arc::new(catalog),
            gateway,
            Arc::new(MarkerModerationDetector::default()),
            RouterSettings::default(),
        )
    }

    fn catalog() -> DestinationCatalog {
        DestinationCatalog::new([("Sales", "arnA"), ("Default", "arnD")])
    }

    #[tokio::test]
    async fn test_handover_stops_reading() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_stream(["Let me ", "connect you. [HANDOVER: Sa", "les]", "ignored", "ignored"]),
        );
        let router = router_with(catalog(), gateway.clone());

        let response = router.handle(&VoiceTurnRequest { audio_chunk: "AAAA".into() }).await;

        assert_eq!(
            response,
            VoiceTurnResponse::Transfer {
                status_code: 200,
                action: "transfer".into(),
                target_queue: "Sales".into(),
                target_queue_arn: Some("arnA".into()),
                message: "Transferring you to Sales...".into(),
            }
        );
        assert_eq!(gateway.chunks_pulled(), 3);
    }

    #[tokio::test]
    async fn test_unknown_destination_falls_back_to_default() {
        let gateway = Arc::new(ScriptedGateway::new().with_stream(["[HANDOVER: Billing]"]));
        let router = router_with(catalog(), gateway);

        let response = router.handle(&VoiceTurnRequest::default()).await;
        match response {
            VoiceTurnResponse::Transfer {
                target_queue,
                target_queue_arn,
                ..
            } => {
                assert_eq!(target_queue, "Billing");
                assert_eq!(target_queue_arn.as_deref(), Some("arnD"));
            }
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_transfers_without_routing_id() {
        let gateway = Arc::new(ScriptedGateway::new().with_stream(["[HANDOVER: Sales]"]));
        let router = router_with(DestinationCatalog::default(), gateway);

        let outcome = router.run(router.gateway.stream(&InferenceRequest::default()).await.unwrap()).await;
        assert_eq!(
            outcome,
            StreamOutcome::Transfer {
                destination_name: "Sales".into(),
                routing_id: None
            }
        );
    }

    #[tokio::test]
    async fn test_moderation_marker_blocks() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_stream(["Sure thing. guardrail_", "intervention [HANDOVER: Sales]", "more"]),
        );
        let router = router_with(catalog(), gateway.clone());

        let response = router.handle(&VoiceTurnRequest::default()).await;

        assert_eq!(
            response,
            VoiceTurnResponse::Status {
                status_code: 400,
                body: "Content blocked".into()
            }
        );
        assert_eq!(gateway.chunks_pulled(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_stream_completes() {
        let gateway = Arc::new(ScriptedGateway::new().with_stream(["Our hours are ", "9 to 5."]));
        let router = router_with(catalog(), gateway);

        let response = router.handle(&VoiceTurnRequest::default()).await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(
            response,
            VoiceTurnResponse::Status {
                status_code: 200,
                body: "Stream processed successfully".into()
            }
        );
    }

    #[tokio::test]
    async fn test_voice_request_carries_audio_and_prompt() {
        let gateway = Arc::new(ScriptedGateway::new().with_stream(Vec::<String>::new()));
        let router = router_with(catalog(), gateway.clone());

        router.handle(&VoiceTurnRequest { audio_chunk: "UklGRg==".into() }).await;

        let requests = gateway.requests();
        assert_eq!(requests[0].audio.as_deref(), Some("UklGRg=="));
        assert!(requests[0].system.as_deref().unwrap().contains("[HANDOVER: Default]"));
    }

    #[tokio::test]
    async fn test_chunk_error_fails() {
        let stream = futures::stream::iter(vec![Ok("hello ".to_string()), Err(Error::upstream("reset"))]).boxed();
        let router = router_with(catalog(), Arc::new(ScriptedGateway::new()));

        let outcome = router.run(stream).await;
        assert!(matches!(outcome, StreamOutcome::Failed { .. }));
        assert_eq!(VoiceTurnResponse::from(outcome).status_code(), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_times_out() {
        let stream = futures::stream::pending::<contact_router_core::Result<String>>().boxed();
        let router = StreamRouter::new(
            Arc::new(catalog()),
            Arc::new(ScriptedGateway::new()),
            Arc::new(MarkerModerationDetector::default()),
            RouterSettings {
                stream_idle_timeout: Duration::from_millis(100),
                ..RouterSettings::default()
            },
        );

        let outcome = router.run(stream).await;
        assert!(matches!(outcome, StreamOutcome::Failed { .. }));
    }
}
