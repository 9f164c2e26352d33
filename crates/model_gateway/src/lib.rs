#![deny(unused)]
//! Inference backends for the contact router.
//!
//! This crate provides:
//! - An HTTP gateway with guardrail-aware request bodies and chunked streaming
//! - A Rig adapter for OpenAI and Anthropic
//! - A deadline wrapper applied to whichever backend is selected

pub mod http;
pub mod rig_client;
pub mod timeout;

pub use http::HttpInferenceGateway;
pub use rig_client::{create_default_client, RigConfig, RigInferenceGateway, RigProvider};
pub use timeout::TimeoutGateway;

use std::sync::Arc;

use contact_router_core::{config::ModelGatewayConfig, traits::InferenceGateway, Result};

/// Build the configured inference backend, wrapped in its call deadline.
///
/// An HTTP endpoint wins over Rig; Rig picks whichever provider key is set.
pub fn create_gateway(config: &ModelGatewayConfig) -> Result<Arc<dyn InferenceGateway>> {
    if let Some(endpoint) = config.endpoint.as_deref() {
        let mut gateway = HttpInferenceGateway::new(endpoint)?.with_max_tokens(config.max_tokens);
        if let Some(model) = &config.model {
            gateway = gateway.with_model(model.clone());
        }
        if let Some(key) = &config.api_key {
            gateway = gateway.with_api_key(key.clone());
        }
        tracing::info!(endpoint, "Using HTTP inference gateway");
        return Ok(Arc::new(TimeoutGateway::new(gateway, config.timeout())));
    }

    let rig = create_default_client(&config.provider, config.model.as_deref(), config.max_tokens)?;
    tracing::info!(
        provider = ?rig.config().provider,
        model = %rig.config().model,
        "Using Rig inference gateway"
    );
    Ok(Arc::new(TimeoutGateway::new(rig, config.timeout())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_router_core::config::AppConfig;

    #[test]
    fn test_http_endpoint_is_preferred() {
        let mut config = AppConfig::default().model_gateway;
        config.endpoint = Some("http://localhost:9000".into());
        assert!(create_gateway(&config).is_ok());
    }

    #[test]
    fn test_bad_endpoint_is_configuration_error() {
        let mut config = AppConfig::default().model_gateway;
        config.endpoint = Some("::nope::".into());
        assert!(matches!(
            create_gateway(&config),
            Err(contact_router_core::Error::Configuration(_))
        ));
    }
}
