#![deny(unused)]
//! Observability for the contact router.
//!
//! This crate provides:
//! - Log and distributed tracing bootstrap
//! - Prometheus metrics for routing paths, stream outcomes, cache and feedback

pub mod metrics;
pub mod tracing_layer;

pub use self::metrics::{
    setup_metrics_recorder, track_cache, track_feedback, track_stream_outcome, track_text_turn,
};
pub use self::tracing_layer::configure_tracing;
