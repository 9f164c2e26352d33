//! Core traits for the contact router.
//!
//! Traits are organized by the component that consumes them:
//! - `gateway`: routing-side seams (CorpusWriter, ModerationDetector)
//! - `store`: Answer Cache storage (AnswerStore)
//! - `llm`: Inference Gateway (InferenceGateway)

pub mod gateway;
pub mod llm;
pub mod store;

pub use gateway::*;
pub use llm::*;
pub use store::*;
