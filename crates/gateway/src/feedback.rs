//! Self-learning feedback.
//!
//! When the classifier maps a free-form utterance onto a destination, the
//! utterance is appended to that destination's sample corpus so that the
//! dialog manager recognizes it directly next time. Submissions are
//! fire-and-forget: they are queued for a detached worker and never delay
//! or fail the turn that produced them.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

use contact_router_core::{traits::CorpusWriter, Error, Result};

/// One utterance learned for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSample {
    pub utterance: String,
    pub destination: String,
}

/// Handle for submitting samples to the background corpus updater.
///
/// Cloning shares the same queue and worker.
#[derive(Clone)]
pub struct FeedbackUpdater {
    sender: Option<mpsc::Sender<FeedbackSample>>,
}

impl FeedbackUpdater {
    /// Start the worker on the current runtime.
    ///
    /// The worker lives until every handle is dropped and the queue drains.
    pub fn spawn(writer: Arc<dyn CorpusWriter>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<FeedbackSample>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(sample) = receiver.recv().await {
                match writer
                    .append_utterance(&sample.destination, &sample.utterance)
                    .await
                {
                    Ok(()) => {
                        contact_router_governance::track_feedback(true);
                        tracing::info!(
                            destination = %sample.destination,
                            "Learned utterance for destination"
                        );
                    }
                    Err(e) => {
                        contact_router_governance::track_feedback(false);
                        tracing::warn!(
                            destination = %sample.destination,
                            error = %e,
                            "Feedback update failed"
                        );
                    }
                }
            }
            tracing::debug!("Feedback worker stopped");
        });

        Self {
            sender: Some(sender),
        }
    }

    /// Updater that drops every sample.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Queue a sample without waiting. A full queue drops it.
    pub fn submit(&self, utterance: &str, destination: &str) {
        let Some(sender) = &self.sender else {
            return;
        };

        let sample = FeedbackSample {
            utterance: utterance.to_string(),
            destination: destination.to_string(),
        };

        if let Err(e) = sender.try_send(sample) {
            contact_router_governance::track_feedback(false);
            tracing::warn!(destination = %destination, error = %e, "Feedback sample dropped");
        }
    }
}

// =============================================================================
// Corpus Writers
// =============================================================================

/// Writer used when no corpus service is configured; logs samples only.
#[derive(Debug, Default)]
pub struct LoggingCorpusWriter;

#[async_trait]
impl CorpusWriter for LoggingCorpusWriter {
    async fn append_utterance(&self, destination: &str, utterance: &str) -> Result<()> {
        tracing::info!(
            destination = %destination,
            utterance = %utterance,
            "No corpus endpoint configured, sample not persisted"
        );
        Ok(())
    }
}

/// Sample utterances of one destination intent, as served by the corpus service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSamples {
    #[serde(default)]
    pub sample_utterances: Vec<String>,
}

/// Corpus writer backed by an HTTP intent service.
///
/// Reads the intent's current samples, appends the utterance unless it is
/// already present, and writes the full list back.
pub struct HttpCorpusWriter {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<Secret<String>>,
}

impl HttpCorpusWriter {
    pub fn new(endpoint: &str, token: Option<Secret<String>>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::configuration(format!("Invalid corpus endpoint: {}", e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "Corpus endpoint cannot be a base URL: {}",
                endpoint
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        })
    }

    fn intent_url(&self, destination: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("Corpus endpoint cannot be a base URL"))?
            .pop_if_empty()
            .push("intents")
            .push(destination);
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl CorpusWriter for HttpCorpusWriter {
    async fn append_utterance(&self, destination: &str, utterance: &str) -> Result<()> {
        let url = self.intent_url(destination)?;

        let resp = self
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| Error::feedback(format!("Failed to read intent: {}", e)))?;
        if !resp.status().is_success() {
            return Err(Error::feedback(format!(
                "Reading intent {} returned {}",
                destination,
                resp.status()
            )));
        }
        let mut samples: IntentSamples = resp
            .json()
            .await
            .map_err(|e| Error::feedback(format!("Malformed intent: {}", e)))?;

        let utterance = utterance.trim();
        if samples.sample_utterances.iter().any(|s| s.trim() == utterance) {
            tracing::debug!(destination = %destination, "Utterance already known");
            return Ok(());
        }
        samples.sample_utterances.push(utterance.to_string());

        let resp = self
            .authorize(self.client.put(url))
            .json(&samples)
            .send()
            .await
            .map_err(|e| Error::feedback(format!("Failed to update intent: {}", e)))?;
        if !resp.status().is_success() {
            return Err(Error::feedback(format!(
                "Updating intent {} returned {}",
                destination,
                resp.status()
            )));
        }

        Ok(())
    }
}
