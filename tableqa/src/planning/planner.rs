//! Model-driven planning with a deterministic fallback.

use super::{classify, fallback_graph, parse_plan, planner_prompt};
use crate::cancellation::CallScope;
use crate::context::ExecutionContext;
use crate::core::{Strategy, SubTaskGraph};
use crate::services::{generate_scoped, GenerationParams, GenerationRequest, GenerationService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Heading used when rendering accumulated context into prompts.
pub const CONTEXT_HEADING: &str = "Current context";

/// The graph produced for one round, and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// The strategy chosen by the classifier.
    pub strategy: Strategy,
    /// The graph to dispatch.
    pub graph: SubTaskGraph,
    /// Why the fallback graph was used, if it was.
    pub fallback_reason: Option<String>,
}

impl PlanOutcome {
    /// True if the graph is the strategy's fallback template.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Produces a sub-task graph for a question.
#[derive(Clone)]
pub struct Planner {
    generator: Arc<dyn GenerationService>,
    params: GenerationParams,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("params", &self.params)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Planner {
    /// Creates a planner with 512 tokens at temperature 0.1.
    #[must_use]
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            params: GenerationParams::new(512, 0.1),
            call_timeout: None,
        }
    }

    /// Sets the decoding parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Bounds each planning call.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Classifies the question, asks the model for a plan, and falls back
    /// to the strategy's template if the call fails or the response does
    /// not parse. Never fails.
    pub async fn plan(
        &self,
        question: &str,
        table_summary: &str,
        context: &ExecutionContext,
        scope: &CallScope,
    ) -> PlanOutcome {
        let strategy = classify(question);
        debug!(strategy = %strategy, "Classified question");

        let prompt = planner_prompt(
            table_summary,
            question,
            &context.render(CONTEXT_HEADING),
            strategy,
        );
        let request = GenerationRequest::new(prompt, self.params);

        let response =
            match generate_scoped(self.generator.as_ref(), &request, scope, self.call_timeout).await {
                Ok(text) => text,
                Err(e) => return self.fallback(strategy, e.to_string()),
            };

        match parse_plan(&response) {
            Ok(graph) => PlanOutcome {
                strategy,
                graph,
                fallback_reason: None,
            },
            Err(e) => {
                let preview: String = response.chars().take(200).collect();
                debug!(response = %preview, "Unparseable planner response");
                self.fallback(strategy, e.to_string())
            }
        }
    }

    fn fallback(&self, strategy: Strategy, reason: String) -> PlanOutcome {
        warn!(strategy = %strategy, reason = %reason, "Using fallback plan");
        PlanOutcome {
            strategy,
            graph: fallback_graph(strategy),
            fallback_reason: Some(reason),
        }
    }
}
