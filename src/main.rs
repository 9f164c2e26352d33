#![deny(unused)]
//! Contact Router - hybrid conversational routing service
//!
//! Serves discrete text turns through a cache-augmented classifier and
//! streamed voice turns through an in-band handover detector, learning new
//! utterances for its destinations as it goes.

use std::sync::Arc;

use contact_router_core::{config::AppConfig, traits::CorpusWriter, types::DestinationCatalog};
use contact_router_gateway::{
    AnswerCache, FeedbackUpdater, GatewayConfig, GatewayServer, HttpCorpusWriter,
    LoggingCorpusWriter, MarkerModerationDetector, RouterSettings, StreamRouter, TextRouter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    contact_router_governance::configure_tracing(config.telemetry.json_logs)?;

    tracing::info!("Starting Contact Router v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Destination Catalog
    // =========================================================================
    let catalog = Arc::new(DestinationCatalog::from_json(config.router.queue_map.as_deref()));

    // =========================================================================
    // Answer Cache
    // =========================================================================
    let store = contact_router_store::create_answer_store(&config.cache)?;
    let cache = AnswerCache::new(store).with_ttl(config.cache.ttl());

    // =========================================================================
    // Inference Gateway
    // =========================================================================
    let gateway = contact_router_model_gateway::create_gateway(&config.model_gateway)?;

    let settings = RouterSettings::from_config(&config);
    if settings.moderation.is_none() {
        tracing::info!("No moderation policy configured");
    }

    // =========================================================================
    // Feedback Updater
    // =========================================================================
    let writer: Arc<dyn CorpusWriter> = match config.feedback.endpoint.as_deref() {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "Learning utterances into the corpus service");
            Arc::new(HttpCorpusWriter::new(endpoint, config.feedback.token.clone())?)
        }
        None => Arc::new(LoggingCorpusWriter),
    };
    let feedback = FeedbackUpdater::spawn(writer, config.feedback.queue_capacity);

    // =========================================================================
    // Routers & Server
    // =========================================================================
    let text = TextRouter::new(
        catalog.clone(),
        gateway.clone(),
        cache,
        feedback,
        settings.clone(),
    );
    let voice = StreamRouter::new(
        catalog,
        gateway,
        Arc::new(MarkerModerationDetector::default()),
        settings,
    );

    let mut server = GatewayServer::new(GatewayConfig::from(&config.server), text, voice);

    if config.telemetry.metrics {
        let handle = contact_router_governance::setup_metrics_recorder()?;
        server = server.with_metrics(handle);
    }

    server.run().await?;

    Ok(())
}
