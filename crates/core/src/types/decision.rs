use serde::{Deserialize, Serialize};

// =============================================================================
// Text Path Outcomes
// =============================================================================

/// What a text turn resolved to. Exactly one variant per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Hand the conversation to a human-agent destination.
    Transfer {
        destination_name: String,
        routing_id: String,
    },
    /// Reply with text.
    Answer { text: String },
    /// The moderation policy vetoed the reply.
    Blocked { reason: String },
}

/// How a text turn reached its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePath {
    ExplicitTransfer,
    UnknownDestination,
    CacheHit,
    SelfLearned,
    Generated,
    InferenceFallback,
    Moderated,
    Unhandled,
}

impl RoutePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitTransfer => "explicit_transfer",
            Self::UnknownDestination => "unknown_destination",
            Self::CacheHit => "cache_hit",
            Self::SelfLearned => "self_learned",
            Self::Generated => "generated",
            Self::InferenceFallback => "inference_fallback",
            Self::Moderated => "moderated",
            Self::Unhandled => "unhandled",
        }
    }
}

/// A routed text turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTurnOutcome {
    pub decision: RouteDecision,
    pub path: RoutePath,
}

impl TextTurnOutcome {
    pub fn new(decision: RouteDecision, path: RoutePath) -> Self {
        Self { decision, path }
    }

    pub fn answer(text: impl Into<String>, path: RoutePath) -> Self {
        Self::new(RouteDecision::Answer { text: text.into() }, path)
    }
}

// =============================================================================
// Voice Path Outcomes
// =============================================================================

/// Signal decoded at a chunk boundary of a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Continue,
    HandoverRequested { destination_name: String },
    ModerationBlocked,
}

impl StreamSignal {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Terminal state of a streamed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A handover marker was decoded. `routing_id` is `None` only when the
    /// catalog is empty.
    Transfer {
        destination_name: String,
        routing_id: Option<String>,
    },
    Blocked,
    Completed,
    /// The stream could not be opened or broke mid-way.
    Failed { reason: String },
}

impl StreamOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}
