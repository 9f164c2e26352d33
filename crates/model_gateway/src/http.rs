//! HTTP inference gateway.
//!
//! Talks to an inference service exposing `POST {endpoint}/invoke` for
//! complete responses and `POST {endpoint}/invoke-stream` for a chunked
//! plain-text body. The moderation policy travels in the request body as
//! `guardrailIdentifier` / `guardrailVersion`.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use url::Url;

use contact_router_core::{
    traits::InferenceGateway,
    types::{ChunkStream, InferenceRequest, InferenceResponse},
    Error, Result,
};

/// Stop reason the service reports when the guardrail replaced the output.
const GUARDRAIL_STOP_REASON: &str = "guardrail_intervened";

/// Wire body of an invoke call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<&'a str>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    guardrail_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guardrail_version: Option<&'a str>,
    trace: &'static str,
}

#[derive(Debug, Deserialize)]
struct InvokeReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Inference gateway over plain HTTP.
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    endpoint: Url,
    model: Option<String>,
    max_tokens: u32,
    api_key: Option<Secret<String>>,
}

impl HttpInferenceGateway {
    /// Create a gateway for the service at `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| Error::configuration(format!("Invalid inference endpoint: {}", e)))?;
        // Keep the base path when joining relative routes.
        if !endpoint.path().ends_with('/') {
            endpoint.set_path(&format!("{}/", endpoint.path()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            model: None,
            max_tokens: 1000,
            api_key: None,
        })
    }

    /// Set the model identifier forwarded to the service.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the default token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Authenticate with a bearer token.
    pub fn with_api_key(mut self, key: Secret<String>) -> Self {
        self.api_key = Some(key);
        self
    }

    fn route(&self, path: &str) -> Result<Url> {
        self.endpoint
            .join(path)
            .map_err(|e| Error::configuration(format!("Invalid inference route: {}", e)))
    }

    async fn send(&self, path: &str, request: &InferenceRequest, stream: bool) -> Result<reqwest::Response> {
        let body = InvokeBody {
            model_id: self.model.as_deref(),
            system: request.system.as_deref(),
            prompt: &request.prompt,
            audio: request.audio.as_deref(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            stream,
            guardrail_identifier: request.moderation.as_ref().map(|p| p.identifier.as_str()),
            guardrail_version: request.moderation.as_ref().map(|p| p.version.as_str()),
            trace: "ENABLED",
        };

        let mut builder = self.client.post(self.route(path)?).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Inference request failed: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        if status.is_client_error() && text.to_lowercase().contains("guardrail") {
            return Err(Error::moderation(text));
        }
        Err(Error::upstream(format!("Inference service returned {}: {}", status, text)))
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        tracing::debug!(
            endpoint = %self.endpoint,
            prompt_len = request.prompt.len(),
            moderated = request.moderation.is_some(),
            "Calling inference service"
        );

        let reply: InvokeReply = self
            .send("invoke", request, false)
            .await?
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Malformed inference reply: {}", e)))?;

        let stop_reason = reply.stop_reason.unwrap_or_else(|| "stop".to_string());
        if stop_reason == GUARDRAIL_STOP_REASON {
            return Err(Error::moderation("output replaced by guardrail"));
        }

        let content = reply
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| Error::upstream("Inference reply had no content"))?;

        Ok(InferenceResponse {
            content,
            stop_reason,
        })
    }

    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_audio = request.audio.is_some(),
            moderated = request.moderation.is_some(),
            "Opening inference stream"
        );

        let resp = self.send("invoke-stream", request, true).await?;

        let mut decoder = Utf8ChunkDecoder::default();
        let stream = resp
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => Ok(decoder.push(&bytes)),
                Err(e) => Err(Error::upstream(format!("Inference stream broke: {}", e))),
            })
            .try_filter(|text| futures::future::ready(!text.is_empty()));

        Ok(stream.boxed())
    }
}

/// Decodes a byte stream into text, holding back a code point split across
/// network chunks until its remaining bytes arrive.
#[derive(Debug, Default)]
struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // Incomplete trailing sequence: emit what is complete.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            // Genuinely invalid bytes: replace them rather than stall.
            Err(_) => self.pending.len(),
        };

        let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
        self.pending.drain(..valid);
        text
    }
}
