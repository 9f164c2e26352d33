use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::decision::{RouteDecision, RoutePath, StreamOutcome, TextTurnOutcome};

// =============================================================================
// Inbound Text Turn
// =============================================================================

/// Intent name for an explicit transfer request.
pub const TALK_TO_AGENT_INTENT: &str = "TalkToAgent";
/// Intent name for free-form questions the dialog manager could not match.
pub const FALLBACK_INTENT: &str = "FallbackIntent";
/// Slot carrying the requested department on a transfer request.
pub const DEPARTMENT_SLOT: &str = "Department";

/// Session attribute naming the transfer destination.
pub const TARGET_QUEUE_ATTR: &str = "TargetQueue";
/// Session attribute carrying the destination's routing id.
pub const TARGET_QUEUE_ARN_ATTR: &str = "TargetQueueArn";

/// A discrete turn from the dialog manager.
///
/// Every field defaults when absent so that a sparse payload still routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextTurnRequest {
    pub intent_name: String,
    pub utterance: String,
    pub slots: HashMap<String, String>,
    pub session_attributes: HashMap<String, String>,
}

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnIntent {
    /// Destination named directly by the caller.
    TransferRequest { department: Option<String> },
    /// Free-form question.
    FreeForm,
    Unsupported,
}

impl TextTurnRequest {
    pub fn free_form(utterance: impl Into<String>) -> Self {
        Self {
            intent_name: FALLBACK_INTENT.into(),
            utterance: utterance.into(),
            ..Default::default()
        }
    }

    pub fn transfer(department: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(DEPARTMENT_SLOT.to_string(), department.into());
        Self {
            intent_name: TALK_TO_AGENT_INTENT.into(),
            slots,
            ..Default::default()
        }
    }

    pub fn intent(&self) -> TurnIntent {
        match self.intent_name.as_str() {
            TALK_TO_AGENT_INTENT => TurnIntent::TransferRequest {
                department: self
                    .slots
                    .get(DEPARTMENT_SLOT)
                    .map(|d| d.trim())
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            },
            FALLBACK_INTENT => TurnIntent::FreeForm,
            _ => TurnIntent::Unsupported,
        }
    }
}

// =============================================================================
// Outbound Text Turn
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMessage {
    pub content_type: String,
    pub content: String,
}

impl TurnMessage {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content_type: "PlainText".into(),
            content: content.into(),
        }
    }
}

/// Closing response handed back to the dialog manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTurnResponse {
    pub dialog_action: String,
    pub intent_name: String,
    pub intent_state: String,
    pub session_attributes: HashMap<String, String>,
    pub messages: Vec<TurnMessage>,
}

impl TextTurnResponse {
    /// Close the turn, rendering the outcome into user-facing text.
    pub fn close(request: &TextTurnRequest, outcome: &TextTurnOutcome) -> Self {
        let mut session_attributes = request.session_attributes.clone();
        let mut intent_name = request.intent_name.clone();

        let content = match &outcome.decision {
            RouteDecision::Transfer {
                destination_name,
                routing_id,
            } => {
                session_attributes.insert(TARGET_QUEUE_ATTR.into(), destination_name.clone());
                session_attributes.insert(TARGET_QUEUE_ARN_ATTR.into(), routing_id.clone());
                if outcome.path == RoutePath::SelfLearned {
                    intent_name = TALK_TO_AGENT_INTENT.into();
                    format!(
                        "I understand you want to speak to {}. Transferring you now...",
                        destination_name
                    )
                } else {
                    format!("Transferring you to {}...", destination_name)
                }
            }
            RouteDecision::Answer { text } => text.clone(),
            RouteDecision::Blocked { .. } => {
                "I cannot answer that question due to our safety policies.".to_string()
            }
        };

        Self {
            dialog_action: "Close".into(),
            intent_name,
            intent_state: "Fulfilled".into(),
            session_attributes,
            messages: vec![TurnMessage::plain(content)],
        }
    }

    /// Text of the first message, if any.
    pub fn content(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.as_str())
    }
}

// =============================================================================
// Voice Turn
// =============================================================================

/// A streamed (voice) turn. The audio is passed through to the backend as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceTurnRequest {
    pub audio_chunk: String,
}

/// Response for a streamed turn; one shape per terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoiceTurnResponse {
    #[serde(rename_all = "camelCase")]
    Transfer {
        status_code: u16,
        action: String,
        target_queue: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_queue_arn: Option<String>,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Status { status_code: u16, body: String },
}

impl VoiceTurnResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transfer { status_code, .. } | Self::Status { status_code, .. } => *status_code,
        }
    }
}

impl From<StreamOutcome> for VoiceTurnResponse {
    fn from(outcome: StreamOutcome) -> Self {
        match outcome {
            StreamOutcome::Transfer {
                destination_name,
                routing_id,
            } => Self::Transfer {
                status_code: 200,
                action: "transfer".into(),
                message: format!("Transferring you to {}...", destination_name),
                target_queue: destination_name,
                target_queue_arn: routing_id,
            },
            StreamOutcome::Blocked => Self::Status {
                status_code: 400,
                body: "Content blocked".into(),
            },
            StreamOutcome::Completed => Self::Status {
                status_code: 200,
                body: "Stream processed successfully".into(),
            },
            StreamOutcome::Failed { .. } => Self::Status {
                status_code: 500,
                body: "Error processing audio".into(),
            },
        }
    }
}
