#![deny(unused)]
//! Routing gateway for the contact router.
//!
//! This crate provides the two entry points of the system, the text router
//! and the streaming voice router, together with the answer cache, the
//! self-learning feedback loop and the HTTP surface that exposes them.

pub mod answer_cache;
pub mod feedback;
pub mod handover;
pub mod prompt;
pub mod server;
pub mod stream_router;
pub mod text_router;

pub use answer_cache::AnswerCache;
pub use feedback::{FeedbackUpdater, HttpCorpusWriter, LoggingCorpusWriter};
pub use handover::{HandoverScanner, MarkerModerationDetector};
pub use server::{GatewayConfig, GatewayServer};
pub use stream_router::StreamRouter;
pub use text_router::TextRouter;

use std::time::Duration;

use contact_router_core::{config::AppConfig, config::DEFAULT_LOCALE, types::ModerationPolicy};

/// Per-process settings shared by both routers.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Locale passed to the model.
    pub locale: String,
    /// Policy attached to every inference call, when configured.
    pub moderation: Option<ModerationPolicy>,
    /// Longest wait for the next chunk of a voice stream.
    pub stream_idle_timeout: Duration,
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            locale: config.router.locale.clone(),
            moderation: config.moderation.policy(),
            stream_idle_timeout: config.router.stream_idle_timeout(),
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            moderation: None,
            stream_idle_timeout: Duration::from_secs(15),
        }
    }
}
