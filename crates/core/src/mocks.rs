//! Mock implementations of core traits for testing.
//!
//! Scripted stand-ins for the inference backend, the answer store and the
//! intent corpus, shared by unit and integration tests across the workspace.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::{
    traits::{AnswerStore, CorpusWriter, InferenceGateway},
    types::{CacheEntry, ChunkStream, Fingerprint, InferenceRequest, InferenceResponse},
    Error, Result,
};

// =============================================================================
// Mock Inference Gateway
// =============================================================================

/// One scripted reply of the mock gateway.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this text.
    Text(String),
    /// Fail with an upstream error.
    Fail(String),
    /// Report a moderation veto.
    Moderated,
    /// Never return.
    Hang,
}

/// Scripted gateway that replays queued completions and chunk streams.
///
/// When a queue runs dry the last completion keeps repeating and streams
/// come back empty.
pub struct ScriptedGateway {
    completions: Mutex<VecDeque<MockReply>>,
    last_completion: Mutex<Option<MockReply>>,
    streams: Mutex<VecDeque<Vec<String>>>,
    complete_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    chunks_pulled: Arc<AtomicUsize>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            completions: Mutex::new(VecDeque::new()),
            last_completion: Mutex::new(None),
            streams: Mutex::new(VecDeque::new()),
            complete_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            chunks_pulled: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that always completes with `text`.
    pub fn constant(text: &str) -> Self {
        Self::new().then(MockReply::Text(text.to_string()))
    }

    /// Queue a completion reply.
    pub fn then(self, reply: MockReply) -> Self {
        self.completions.lock().unwrap().push_back(reply);
        self
    }

    /// Queue a chunk stream.
    pub fn with_stream<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.streams
            .lock()
            .unwrap()
            .push_back(chunks.into_iter().map(Into::into).collect());
        self
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Chunks consumers actually pulled from opened streams.
    pub fn chunks_pulled(&self) -> usize {
        self.chunks_pulled.load(Ordering::SeqCst)
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_completion(&self) -> MockReply {
        let next = self.completions.lock().unwrap().pop_front();
        let mut last = self.last_completion.lock().unwrap();
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .unwrap_or_else(|| MockReply::Fail("no scripted completion".into())),
        }
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.next_completion() {
            MockReply::Text(text) => Ok(InferenceResponse::text(text)),
            MockReply::Fail(msg) => Err(Error::upstream(msg)),
            MockReply::Moderated => Err(Error::moderation("guardrail intervened")),
            MockReply::Hang => futures::future::pending().await,
        }
    }

    async fn stream(&self, request: &InferenceRequest) -> Result<ChunkStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let chunks = self.streams.lock().unwrap().pop_front().unwrap_or_default();
        let pulled = self.chunks_pulled.clone();
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            pulled.fetch_add(1, Ordering::SeqCst);
            Ok(chunk)
        });
        Ok(stream.boxed())
    }
}

// =============================================================================
// Mock Answer Store
// =============================================================================

/// In-memory answer store with failure injection.
#[derive(Default)]
pub struct MockAnswerStore {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    failing: bool,
    puts: AtomicUsize,
}

impl MockAnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every call errors.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Seed the store with an entry, bypassing the trait.
    pub fn seed(&self, entry: CacheEntry) {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.fingerprint.clone(), entry);
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AnswerStore for MockAnswerStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        if self.failing {
            return Err(Error::storage("mock store unavailable"));
        }
        Ok(self.entries.lock().unwrap().get(fingerprint).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::storage("mock store unavailable"));
        }
        self.seed(entry);
        Ok(())
    }
}

// =============================================================================
// Mock Corpus Writer
// =============================================================================

/// Corpus writer that records every sample.
///
/// A gated writer parks each call until [`RecordingCorpusWriter::release`]
/// is called, which lets tests prove callers never wait on it.
#[derive(Default)]
pub struct RecordingCorpusWriter {
    samples: Mutex<Vec<(String, String)>>,
    gate: Option<Notify>,
    fail: bool,
    recorded: Notify,
}

impl RecordingCorpusWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that blocks until released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    /// Writer that records and then errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Let one parked call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Recorded `(destination, utterance)` pairs.
    pub fn samples(&self) -> Vec<(String, String)> {
        self.samples.lock().unwrap().clone()
    }

    /// Wait until at least `count` samples were recorded.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.recorded.notified();
            if self.samples.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl CorpusWriter for RecordingCorpusWriter {
    async fn append_utterance(&self, destination: &str, utterance: &str) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.samples
            .lock()
            .unwrap()
            .push((destination.to_string(), utterance.to_string()));
        self.recorded.notify_waiters();

        if self.fail {
            Err(Error::feedback("mock corpus rejected the sample"))
        } else {
            Ok(())
        }
    }
}
