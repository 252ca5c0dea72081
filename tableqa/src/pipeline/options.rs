//! Read-only options for one pipeline instance.

use crate::errors::TableQaError;
use crate::retrieval::RetrievalOptions;
use crate::services::GenerationParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options consumed by the scheduler, executor, aggregator and
/// single-shot mode.
///
/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Upper bound on planning rounds.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Results requested from each retrieval method.
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    /// Literal table rows shown in execution prompts.
    #[serde(default = "default_execution_table_rows")]
    pub execution_table_rows: usize,
    /// Retrieval snippets quoted in execution prompts.
    #[serde(default = "default_max_snippets")]
    pub max_snippets_in_prompt: usize,
    /// Decoding parameters for planning calls.
    #[serde(default = "default_planner_params")]
    pub planner: GenerationParams,
    /// Decoding parameters for sub-task calls.
    #[serde(default = "default_executor_params")]
    pub executor: GenerationParams,
    /// Decoding parameters for the synthesis call.
    #[serde(default = "default_aggregator_params")]
    pub aggregator: GenerationParams,
    /// Decoding parameters for single-shot mode.
    #[serde(default = "default_single_shot_params")]
    pub single_shot: GenerationParams,
    /// Per-call timeout in milliseconds; none by default.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    /// Hybrid retrieval scoring.
    #[serde(default)]
    pub retrieval: RetrievalOptions,
}

fn default_max_iterations() -> usize {
    5
}

fn default_retrieval_top_k() -> usize {
    3
}

fn default_execution_table_rows() -> usize {
    10
}

fn default_max_snippets() -> usize {
    3
}

fn default_planner_params() -> GenerationParams {
    GenerationParams::new(512, 0.1)
}

fn default_executor_params() -> GenerationParams {
    GenerationParams::new(256, 0.1)
}

fn default_aggregator_params() -> GenerationParams {
    GenerationParams::new(256, 0.1)
}

fn default_single_shot_params() -> GenerationParams {
    GenerationParams::new(512, 0.1)
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            retrieval_top_k: default_retrieval_top_k(),
            execution_table_rows: default_execution_table_rows(),
            max_snippets_in_prompt: default_max_snippets(),
            planner: default_planner_params(),
            executor: default_executor_params(),
            aggregator: default_aggregator_params(),
            single_shot: default_single_shot_params(),
            call_timeout_ms: None,
            retrieval: RetrievalOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the text is not valid JSON for this shape.
    pub fn from_json_str(text: &str) -> Result<Self, TableQaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets the round limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets results per retrieval method.
    #[must_use]
    pub fn with_retrieval_top_k(mut self, top_k: usize) -> Self {
        self.retrieval_top_k = top_k;
        self
    }

    /// Sets literal rows in execution prompts.
    #[must_use]
    pub fn with_execution_table_rows(mut self, rows: usize) -> Self {
        self.execution_table_rows = rows;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets hybrid retrieval scoring.
    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalOptions) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Sets planner decoding parameters.
    #[must_use]
    pub fn with_planner_params(mut self, params: GenerationParams) -> Self {
        self.planner = params;
        self
    }

    /// Sets executor decoding parameters.
    #[must_use]
    pub fn with_executor_params(mut self, params: GenerationParams) -> Self {
        self.executor = params;
        self
    }

    /// Gets the per-call timeout as a Duration.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.max_iterations, 5);
        assert_eq!(options.retrieval_top_k, 3);
        assert_eq!(options.execution_table_rows, 10);
        assert_eq!(options.planner.max_tokens, 512);
        assert_eq!(options.executor.max_tokens, 256);
        assert_eq!(options.aggregator.max_tokens, 256);
        assert_eq!(options.single_shot.max_tokens, 512);
        assert_eq!(options.call_timeout(), None);
        assert!((options.retrieval.overlap_threshold - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_partial() {
        let options = PipelineOptions::from_json_str(
            r#"{"max_iterations": 2, "call_timeout_ms": 1500, "retrieval": {"dense_weight": 0.5}}"#,
        )
        .unwrap();

        assert_eq!(options.max_iterations, 2);
        assert_eq!(options.call_timeout(), Some(Duration::from_millis(1500)));
        assert!((options.retrieval.dense_weight - 0.5).abs() < 1e-12);
        assert!((options.retrieval.bm25_weight - 0.3).abs() < 1e-12);
        assert_eq!(options.retrieval_top_k, 3);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = PipelineOptions::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, TableQaError::Serialization(_)));
    }

    #[test]
    fn test_builders() {
        let options = PipelineOptions::new()
            .with_max_iterations(1)
            .with_call_timeout(Duration::from_secs(2))
            .with_executor_params(GenerationParams::new(64, 0.0));

        assert_eq!(options.max_iterations, 1);
        assert_eq!(options.call_timeout_ms, Some(2000));
        assert_eq!(options.executor.max_tokens, 64);
    }
}
