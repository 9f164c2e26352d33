//! Text path router.
//!
//! One turn resolves to exactly one decision:
//! - an explicit transfer request is looked up in the catalog directly
//! - a free-form question is answered from the cache when a fresh entry exists
//! - otherwise the model either names a department (and the utterance is
//!   learned for it) or answers, in which case the answer is cached

use std::sync::Arc;

use contact_router_core::{
    traits::InferenceGateway,
    types::{
        DestinationCatalog, Fingerprint, InferenceRequest, RouteDecision, RoutePath,
        TextTurnOutcome, TextTurnRequest, TextTurnResponse, TurnIntent,
    },
    Error,
};

use crate::answer_cache::AnswerCache;
use crate::feedback::FeedbackUpdater;
use crate::prompt::classification_prompt;
use crate::RouterSettings;

/// Reply when the backend failed or timed out.
pub const INFERENCE_APOLOGY: &str = "I'm having trouble understanding right now. Please try again.";
/// Reply for intents this router does not handle.
pub const UNHANDLED_REPLY: &str = "I didn't understand that.";

/// Cache-augmented classifier for discrete text turns.
pub struct TextRouter {
    catalog: Arc<DestinationCatalog>,
    gateway: Arc<dyn InferenceGateway>,
    cache: AnswerCache,
    feedback: FeedbackUpdater,
    settings: RouterSettings,
}

impl TextRouter {
    pub fn new(
        catalog: Arc<DestinationCatalog>,
        gateway: Arc<dyn InferenceGateway>,
        cache: AnswerCache,
        feedback: FeedbackUpdater,
        settings: RouterSettings,
    ) -> Self {
        Self {
            catalog,
            gateway,
            cache,
            feedback,
            settings,
        }
    }

    /// Route a turn and render the dialog manager's closing response.
    pub async fn handle(&self, request: &TextTurnRequest) -> TextTurnResponse {
        let outcome = self.route(request).await;
        TextTurnResponse::close(request, &outcome)
    }

    /// Decide a turn.
    pub async fn route(&self, request: &TextTurnRequest) -> TextTurnOutcome {
        let outcome = match request.intent() {
            TurnIntent::TransferRequest { department } => {
                self.explicit_transfer(department.as_deref().unwrap_or_default())
            }
            TurnIntent::FreeForm => self.free_form(&request.utterance).await,
            TurnIntent::Unsupported => {
                tracing::debug!(intent = %request.intent_name, "Unhandled intent");
                TextTurnOutcome::answer(UNHANDLED_REPLY, RoutePath::Unhandled)
            }
        };

        contact_router_governance::track_text_turn(outcome.path.as_str());
        tracing::info!(
            intent = %request.intent_name,
            path = outcome.path.as_str(),
            "Text turn routed"
        );
        outcome
    }

    fn explicit_transfer(&self, department: &str) -> TextTurnOutcome {
        match self.catalog.resolve(department) {
            Some(routing_id) => TextTurnOutcome::new(
                RouteDecision::Transfer {
                    destination_name: department.to_string(),
                    routing_id: routing_id.to_string(),
                },
                RoutePath::ExplicitTransfer,
            ),
            None => {
                let err = Error::UnknownDestination {
                    requested: department.to_string(),
                    available: self.catalog.names().into_iter().map(str::to_string).collect(),
                };
                tracing::info!(requested = %department, "Requested destination not in catalog");
                TextTurnOutcome::answer(err.to_string(), RoutePath::UnknownDestination)
            }
        }
    }

    async fn free_form(&self, utterance: &str) -> TextTurnOutcome {
        let fingerprint = Fingerprint::of(utterance);

        if self.cache.is_enabled() {
            let cached = self.cache.lookup(&fingerprint).await;
            contact_router_governance::track_cache(cached.is_some());
            if let Some(entry) = cached {
                tracing::info!(fingerprint = %fingerprint, "Answer cache hit");
                return TextTurnOutcome::answer(entry.answer, RoutePath::CacheHit);
            }
        }

        let request = InferenceRequest::prompt(classification_prompt(
            &self.catalog,
            &self.settings.locale,
            utterance,
        ))
        .with_moderation(self.settings.moderation.clone());

        let completion = match self.gateway.complete(&request).await {
            Ok(resp) => resp.content.trim().to_string(),
            Err(e) if e.is_moderation() => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Reply blocked by moderation policy");
                return TextTurnOutcome::new(
                    RouteDecision::Blocked {
                        reason: e.to_string(),
                    },
                    RoutePath::Moderated,
                );
            }
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Inference failed, apologizing");
                return TextTurnOutcome::answer(INFERENCE_APOLOGY, RoutePath::InferenceFallback);
            }
        };

        if completion.is_empty() {
            tracing::warn!(fingerprint = %fingerprint, "Inference returned no text, apologizing");
            return TextTurnOutcome::answer(INFERENCE_APOLOGY, RoutePath::InferenceFallback);
        }

        if let Some(routing_id) = self.catalog.resolve(&completion) {
            tracing::info!(
                destination = %completion,
                "Classified as transfer, learning utterance"
            );
            self.feedback.submit(utterance, &completion);
            return TextTurnOutcome::new(
                RouteDecision::Transfer {
                    routing_id: routing_id.to_string(),
                    destination_name: completion,
                },
                RoutePath::SelfLearned,
            );
        }

        self.cache.remember(&fingerprint, utterance, &completion).await;
        TextTurnOutcome::answer(completion, RoutePath::Generated)
    }
}
