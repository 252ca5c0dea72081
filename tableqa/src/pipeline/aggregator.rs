//! Combining sub-task results into one final answer.

use crate::cancellation::CallScope;
use crate::core::SubtaskResult;
use crate::services::{generate_scoped, GenerationParams, GenerationRequest, GenerationService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Final answer when no sub-task succeeded.
pub const NO_RESULTS_ANSWER: &str = "Unable to answer the question: every sub-task failed.";

/// Final answer when synthesis produced no text.
pub const UNDETERMINED_ANSWER: &str = "Could not determine a final answer from the sub-task results.";

/// Builds the synthesis prompt over successful results, numbered from 1.
#[must_use]
pub fn synthesis_prompt(results: &[&str]) -> String {
    let mut prompt = String::from("\nBased on the following sub-task results, give the final answer:\n\n");
    for (i, result) in results.iter().enumerate() {
        prompt.push_str(&format!("Sub-task {}: {result}\n", i + 1));
    }
    prompt.push_str("\nGive the final answer based on the results above:");
    prompt
}

/// Lists results without a model call.
#[must_use]
pub fn manual_listing(results: &[&str]) -> String {
    let mut summary = String::from("Based on the following sub-task results:\n\n");
    for (i, result) in results.iter().enumerate() {
        summary.push_str(&format!("{}. {result}\n", i + 1));
    }
    summary
}

/// Removes an echoed prompt from the front of decoded text, then trims.
pub(crate) fn strip_prompt_echo<'a>(output: &'a str, prompt: &str) -> &'a str {
    output.strip_prefix(prompt).unwrap_or(output).trim()
}

/// Produces the final answer from every round's results.
#[derive(Clone)]
pub struct Aggregator {
    generator: Arc<dyn GenerationService>,
    params: GenerationParams,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("params", &self.params)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator using 256 tokens at temperature 0.1.
    #[must_use]
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            params: GenerationParams::new(256, 0.1),
            call_timeout: None,
        }
    }

    /// Sets the decoding parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Bounds the synthesis call.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Aggregates results. Never fails.
    ///
    /// No successes gives [`NO_RESULTS_ANSWER`]. A single success is
    /// returned verbatim. Several successes are synthesized with one model
    /// call, falling back to [`manual_listing`] if that call fails or the
    /// scope is already interrupted.
    pub async fn aggregate(&self, results: &[SubtaskResult], scope: &CallScope) -> String {
        let successes: Vec<&str> = results
            .iter()
            .filter(|r| r.is_success())
            .filter_map(|r| r.result.as_deref())
            .collect();

        match successes.as_slice() {
            [] => return NO_RESULTS_ANSWER.to_string(),
            [only] => return (*only).to_string(),
            _ => {}
        }

        let prompt = synthesis_prompt(&successes);
        let request = GenerationRequest::new(prompt, self.params);

        match generate_scoped(self.generator.as_ref(), &request, scope, self.call_timeout).await {
            Ok(output) => {
                let answer = strip_prompt_echo(&output, &request.prompt);
                debug!(results = successes.len(), "Synthesized final answer");
                if answer.is_empty() {
                    UNDETERMINED_ANSWER.to_string()
                } else {
                    answer.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "Synthesis failed, listing results instead");
                manual_listing(&successes)
            }
        }
    }
}
