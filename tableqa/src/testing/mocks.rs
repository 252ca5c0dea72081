//! Scripted collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::errors::{GenerationError, RetrievalError};
use crate::services::{EmbeddingService, GenerationRequest, GenerationService};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn resolve(&self) -> Result<String, GenerationError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Fail(reason) => Err(GenerationError::failed(reason.clone())),
        }
    }
}

/// A generation service that answers from a script and records every call.
///
/// Replies are picked in this order: the first rule whose needle occurs in
/// the prompt, then the next queued reply, then the default.
#[derive(Debug)]
pub struct ScriptedGenerator {
    rules: Vec<(String, Reply)>,
    queue: Mutex<VecDeque<Reply>>,
    default: Reply,
    delay: Option<Duration>,
    echo_prompt: bool,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    /// Creates a generator that returns an empty string.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default: Reply::Text(String::new()),
            delay: None,
            echo_prompt: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the reply used when nothing else matches.
    #[must_use]
    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default = Reply::Text(text.into());
        self
    }

    /// Makes the fallback reply a failure.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.default = Reply::Fail(reason.into());
        self
    }

    /// Replies with `text` whenever the prompt contains `needle`.
    #[must_use]
    pub fn respond_when(mut self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(text.into())));
        self
    }

    /// Fails whenever the prompt contains `needle`.
    #[must_use]
    pub fn fail_when(mut self, needle: impl Into<String>, reason: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Fail(reason.into())));
        self
    }

    /// Queues a one-off reply.
    #[must_use]
    pub fn then(self, text: impl Into<String>) -> Self {
        self.queue.lock().push_back(Reply::Text(text.into()));
        self
    }

    /// Queues a one-off failure.
    #[must_use]
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.queue.lock().push_back(Reply::Fail(reason.into()));
        self
    }

    /// Sleeps before every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prefixes every reply with the prompt, like a decoder that returns
    /// the full sequence.
    #[must_use]
    pub fn echoing_prompt(mut self) -> Self {
        self.echo_prompt = true;
        self
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Returns every prompt received.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.prompt.clone()).collect()
    }

    fn pick(&self, prompt: &str) -> Reply {
        if let Some((_, reply)) = self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            return reply.clone();
        }
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        let reply = self.pick(&request.prompt);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = reply.resolve()?;
        if self.echo_prompt {
            Ok(format!("{}{text}", request.prompt))
        } else {
            Ok(text)
        }
    }
}

/// An embedding service with one axis per keyword.
///
/// A text's vector has 1.0 on every axis whose keyword it contains
/// (case-insensitively) and 0.0 elsewhere.
#[derive(Debug, Clone)]
pub struct KeywordEmbedder {
    axes: Vec<String>,
    calls: std::sync::Arc<Mutex<usize>>,
}

impl KeywordEmbedder {
    /// Creates an embedder over the given keywords.
    #[must_use]
    pub fn new(axes: &[&str]) -> Self {
        Self {
            axes: axes.iter().map(|a| a.to_lowercase()).collect(),
            calls: std::sync::Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of texts encoded.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        *self.calls.lock() += 1;
        let lowered = text.to_lowercase();
        Ok(self
            .axes
            .iter()
            .map(|axis| if lowered.contains(axis.as_str()) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// An embedding service that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingService for FailingEmbedder {
    async fn encode(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        Err(RetrievalError::embedding("embedding model unavailable"))
    }
}
