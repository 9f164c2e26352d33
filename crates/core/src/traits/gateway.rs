//! Routing-side traits.

use async_trait::async_trait;

use crate::error::Result;

/// Write access to the classifier's training corpus.
#[async_trait]
pub trait CorpusWriter: Send + Sync {
    /// Teach the classifier that `utterance` belongs to `destination`.
    async fn append_utterance(&self, destination: &str, utterance: &str) -> Result<()>;
}

/// Recognizes the backend's moderation-intervention signal inside streamed text.
pub trait ModerationDetector: Send + Sync {
    /// Whether `window` contains an intervention marker.
    fn is_intervention(&self, window: &str) -> bool;

    /// Bytes of trailing text to keep between chunks so that a marker split
    /// across chunk boundaries is still seen.
    fn lookback(&self) -> usize;
}
