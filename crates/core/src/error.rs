//! Error types for the contact router.

use thiserror::Error;

/// Result type alias using the router's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the contact router.
///
/// None of these are fatal to the process once it is serving: every variant
/// resolves to a well-formed turn response at the router boundary.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration
    // =========================================================================
    #[error("Configuration degraded: {0}")]
    Configuration(String),

    // =========================================================================
    // Inference Gateway
    // =========================================================================
    #[error("Upstream inference failure: {0}")]
    UpstreamInference(String),

    #[error("Content blocked by moderation policy: {0}")]
    ModerationIntervention(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // =========================================================================
    // Routing
    // =========================================================================
    #[error(
        "Sorry, I couldn't find a queue for {requested}. Available departments are: {}.",
        .available.join(", ")
    )]
    UnknownDestination {
        requested: String,
        available: Vec<String>,
    },

    // =========================================================================
    // Side tasks and storage
    // =========================================================================
    #[error("Feedback update failed: {0}")]
    FeedbackUpdate(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an upstream inference error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamInference(msg.into())
    }

    /// Create a moderation intervention error.
    pub fn moderation(msg: impl Into<String>) -> Self {
        Self::ModerationIntervention(msg.into())
    }

    /// Create a feedback update error.
    pub fn feedback(msg: impl Into<String>) -> Self {
        Self::FeedbackUpdate(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error came from the moderation veto rather than a fault.
    pub fn is_moderation(&self) -> bool {
        matches!(self, Self::ModerationIntervention(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_destination_lists_alternatives() {
        let err = Error::UnknownDestination {
            requested: "Billing".into(),
            available: vec!["Sales".into(), "Support".into()],
        };
        assert_eq!(
            err.to_string(),
            "Sorry, I couldn't find a queue for Billing. Available departments are: Sales, Support."
        );
    }
}
