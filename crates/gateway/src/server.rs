//! Axum-based HTTP server for the router.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use contact_router_core::{
    config::ServerConfig,
    types::{TextTurnRequest, VoiceTurnRequest},
    Error, Result,
};

use crate::stream_router::StreamRouter;
use crate::text_router::TextRouter;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            enable_tracing: config.enable_tracing,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub text: TextRouter,
    pub voice: StreamRouter,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, text: TextRouter, voice: StreamRouter) -> Self {
        Self {
            config,
            state: Arc::new(AppState { text, voice }),
            metrics_handle: None,
        }
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/v1/turns/text", post(text_turn_handler))
            .route("/v1/turns/voice", post(voice_turn_handler))
            .with_state(self.state.clone());

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "Contact router listening");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Discrete text turn from the dialog manager.
async fn text_turn_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TextTurnRequest>,
) -> impl IntoResponse {
    let trace_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("text_turn", trace_id = %trace_id);

    let response = async {
        tracing::info!(
            intent = %payload.intent_name,
            utterance_len = payload.utterance.len(),
            "Processing text turn"
        );
        state.text.handle(&payload).await
    }
    .instrument(span)
    .await;

    Json(response)
}

/// Streamed voice turn. The HTTP status mirrors the body's `statusCode`.
async fn voice_turn_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VoiceTurnRequest>,
) -> impl IntoResponse {
    let trace_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("voice_turn", trace_id = %trace_id);

    let response = async {
        tracing::info!(audio_len = payload.audio_chunk.len(), "Processing voice turn");
        state.voice.handle(&payload).await
    }
    .instrument(span)
    .await;

    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_config_from_server_section() {
        let server = contact_router_core::config::AppConfig::default().server;
        let config = GatewayConfig::from(&server);
        assert_eq!(config.port, 3000);
        assert!(config.enable_cors);
    }
}
