//! Collaborator interfaces the engine calls out to.
//!
//! Model loading and inference live outside this crate. The engine only
//! sees a text-generation capability and, optionally, a text-embedding
//! capability. Both are injected as trait objects.

use crate::cancellation::CallScope;
use crate::errors::{GenerationError, RetrievalError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decoding parameters for one kind of generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationParams {
    /// Creates decoding parameters.
    #[must_use]
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationRequest {
    /// Creates a request from a prompt and decoding parameters.
    #[must_use]
    pub fn new(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }
}

/// Produces text for a prompt.
///
/// Implementations may echo the prompt before the generated text; callers
/// that care strip it.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generates text for the request.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` if the underlying model call fails.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Maps text to a dense vector.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Encodes one text.
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::Embedding` if encoding fails.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Runs one generation call under a scope.
///
/// # Errors
///
/// Returns the collaborator's error, or `Cancelled`/`Timeout` when the
/// scope interrupts the call. Empty text is returned as-is; callers decide
/// what an empty answer means.
pub async fn generate_scoped(
    generator: &dyn GenerationService,
    request: &GenerationRequest,
    scope: &CallScope,
    call_timeout: Option<Duration>,
) -> Result<String, GenerationError> {
    scope.guard(call_timeout, generator.generate(request)).await?
}
