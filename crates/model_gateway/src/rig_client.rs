//! Rig inference adapter.
//!
//! Wraps Rig's Agent for integration with our InferenceGateway trait. Rig
//! has no notion of a guardrail policy or an audio payload, so both are
//! ignored with a warning, and streaming yields the whole reply as a
//! single chunk.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};

use contact_router_core::{
    traits::InferenceGateway,
    types::{ChunkStream, InferenceRequest, InferenceResponse},
    Error, Result,
};

use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;

/// Provider type for Rig clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigProvider {
    OpenAI,
    Anthropic,
}

impl RigProvider {
    /// Parse a configured provider name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-haiku-20240307",
        }
    }
}

/// Configuration for the Rig adapter.
#[derive(Debug, Clone)]
pub struct RigConfig {
    pub provider: RigProvider,
    pub model: String,
    pub max_tokens: u32,
}

impl RigConfig {
    pub fn new(provider: RigProvider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            max_tokens: 1000,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Whether the provider's API key is present in the environment.
    pub fn has_credentials(&self) -> bool {
        std::env::var(self.provider.key_var()).is_ok()
    }
}

/// Rig-backed inference gateway.
pub struct RigInferenceGateway {
    config: RigConfig,
    warned_unsupported: AtomicBool,
}

impl RigInferenceGateway {
    pub fn new(config: RigConfig) -> Self {
        Self {
            config,
            warned_unsupported: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    fn warn_unsupported(&self, request: &InferenceRequest) {
        if request.moderation.is_none() && request.audio.is_none() {
            return;
        }
        if !self.warned_unsupported.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                provider = ?self.config.provider,
                "Rig backend cannot apply moderation policies or audio input; ignoring them"
            );
        }
    }

    async fn call_openai(&self, request: &InferenceRequest) -> Result<String> {
        use rig::providers::openai;

        // Check env var first to avoid panic
        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(Error::configuration("OPENAI_API_KEY not set"));
        }

        let client = openai::Client::from_env();
        let mut agent_builder = client
            .agent(&self.config.model)
            .max_tokens(request.max_tokens.unwrap_or(self.config.max_tokens) as u64);
        if let Some(ref system) = request.system {
            agent_builder = agent_builder.preamble(system);
        }
        let agent = agent_builder.build();

        agent
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| Error::upstream(format!("OpenAI error: {}", e)))
    }

    async fn call_anthropic(&self, request: &InferenceRequest) -> Result<String> {
        use rig::providers::anthropic;

        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            return Err(Error::configuration("ANTHROPIC_API_KEY not set"));
        }

        let client = anthropic::Client::from_env();
        let mut agent_builder = client
            .agent(&self.config.model)
            .max_tokens(request.max_tokens.unwrap_or(self.config.max_tokens) as u64);
        if let Some(ref system) = request.system {
            agent_builder = agent_builder.preamble(system);
        }
        let agent = agent_builder.build();

        agent
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| Error::upstream(format!("Anthropic error: {}", e)))
    }
}

#[async_trait]
impl InferenceGateway for RigInferenceGateway {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        tracing::debug!(
            provider = ?self.config.provider,
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            "Calling LLM"
        );
        self.warn_unsupported(request);

        let content = match self.config.provider {
            RigProvider::OpenAI => self.call_openai(request).await?,
            RigProvider::Anthropic => self.call_anthropic(request).await?,
        };
        Ok(InferenceResponse::text(content))
    }

    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream> {
        // Rig agents take text only; an audio turn would reach the provider as an empty message.
        if request.audio.is_some() && request.prompt.trim().is_empty() {
            return Err(Error::configuration(
                "Rig backend cannot transcribe audio; configure INFERENCE_ENDPOINT for voice turns",
            ));
        }

        let response = self.complete(request).await?;
        Ok(futures::stream::once(async move { Ok(response.content) }).boxed())
    }
}

/// Pick a Rig provider from the environment, preferring `preferred`.
pub fn create_default_client(preferred: &str, model: Option<&str>, max_tokens: u32) -> Result<RigInferenceGateway> {
    let preferred = RigProvider::parse(preferred);
    let candidates = preferred
        .into_iter()
        .chain([RigProvider::OpenAI, RigProvider::Anthropic]);

    for provider in candidates {
        let mut config = RigConfig::new(provider).with_max_tokens(max_tokens);
        if !config.has_credentials() {
            continue;
        }
        // A configured model only applies to the configured provider.
        if Some(provider) == preferred {
            if let Some(model) = model {
                config = config.with_model(model);
            }
        }
        return Ok(RigInferenceGateway::new(config));
    }

    Err(Error::configuration(
        "No inference backend configured. Set INFERENCE_ENDPOINT, OPENAI_API_KEY or ANTHROPIC_API_KEY",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(RigProvider::parse("OpenAI"), Some(RigProvider::OpenAI));
        assert_eq!(RigProvider::parse("anthropic"), Some(RigProvider::Anthropic));
        assert_eq!(RigProvider::parse("bedrock"), None);
    }

    #[test]
    fn test_config_builder() {
        let config = RigConfig::new(RigProvider::Anthropic)
            .with_model("claude-3-5-sonnet-20241022")
            .with_max_tokens(200);

        assert_eq!(config.provider, RigProvider::Anthropic);
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.max_tokens, 200);
    }

    #[test]
    fn test_default_models() {
        assert_eq!(RigConfig::new(RigProvider::OpenAI).model, "gpt-4o-mini");
        assert_eq!(RigConfig::new(RigProvider::Anthropic).model, "claude-3-haiku-20240307");
    }

    #[tokio::test]
    async fn test_audio_only_stream_is_a_configuration_error() {
        let gateway = RigInferenceGateway::new(RigConfig::new(RigProvider::OpenAI));
        let request = InferenceRequest::prompt("")
            .with_system("Route the caller.")
            .with_audio("UklGRg==");

        match gateway.stream(&request).await {
            Err(Error::Configuration(msg)) => assert!(msg.contains("INFERENCE_ENDPOINT")),
            Err(other) => panic!("expected a configuration error, got {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }
}
