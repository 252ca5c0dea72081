//! Running one sub-task against the table.

use super::execution_prompt;
use crate::cancellation::CallScope;
use crate::context::ExecutionContext;
use crate::core::{SubTask, SubtaskResult, Table, DEFAULT_RENDER_ROWS};
use crate::retrieval::{RetrievalRegistry, RetrievalResult};
use crate::services::{generate_scoped, GenerationParams, GenerationRequest, GenerationService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Executes sub-tasks with retrieval-augmented prompts.
#[derive(Clone)]
pub struct Executor {
    generator: Arc<dyn GenerationService>,
    registry: Option<Arc<RetrievalRegistry>>,
    params: GenerationParams,
    top_k: usize,
    table_rows: usize,
    max_snippets: usize,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .field("params", &self.params)
            .field("top_k", &self.top_k)
            .field("table_rows", &self.table_rows)
            .field("max_snippets", &self.max_snippets)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor without retrieval, using 256 tokens at
    /// temperature 0.1.
    #[must_use]
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            registry: None,
            params: GenerationParams::new(256, 0.1),
            top_k: 3,
            table_rows: DEFAULT_RENDER_ROWS,
            max_snippets: 3,
            call_timeout: None,
        }
    }

    /// Gathers snippets from every registered method.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<RetrievalRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the decoding parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Sets results requested from each retrieval method.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the literal table rows shown in prompts.
    #[must_use]
    pub fn with_table_rows(mut self, rows: usize) -> Self {
        self.table_rows = rows;
        self
    }

    /// Sets how many snippets are quoted in prompts.
    #[must_use]
    pub fn with_max_snippets(mut self, max: usize) -> Self {
        self.max_snippets = max;
        self
    }

    /// Bounds each execution call.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Collects snippets for a query: every method's results, concatenated
    /// in registration order without de-duplication.
    pub async fn retrieve(&self, query: &str, table: &Table, scope: &CallScope) -> Vec<RetrievalResult> {
        let Some(registry) = &self.registry else {
            return Vec::new();
        };

        registry
            .multi_search(query, table, self.top_k, scope)
            .await
            .into_iter()
            .flat_map(|(_, results)| results)
            .collect()
    }

    /// Executes one sub-task. Never fails: generation errors become an
    /// error status carrying whatever snippets were gathered.
    pub async fn execute(
        &self,
        subtask: &SubTask,
        table: &Table,
        context: &ExecutionContext,
        scope: &CallScope,
    ) -> SubtaskResult {
        let snippets = if subtask.task_type.uses_retrieval() {
            self.retrieve(&subtask.description, table, scope).await
        } else {
            Vec::new()
        };

        let prompt = execution_prompt(
            subtask,
            table,
            context,
            &snippets,
            self.table_rows,
            self.max_snippets,
        );
        let request = GenerationRequest::new(prompt, self.params);

        let result = match generate_scoped(self.generator.as_ref(), &request, scope, self.call_timeout).await {
            Ok(text) => {
                debug!(task_id = %subtask.id, "Sub-task succeeded");
                SubtaskResult::success(&subtask.id, text)
            }
            Err(e) => {
                warn!(task_id = %subtask.id, error = %e, "Sub-task failed");
                SubtaskResult::error(&subtask.id, e.to_string())
            }
        };

        result
            .with_reasoning(subtask.reasoning_steps.clone())
            .with_retrieval(snippets)
    }
}
