//! The question-answering entry point.

use super::single_shot::{answer_single_shot, END_TO_END_STRATEGY};
use super::{Aggregator, PipelineOptions, Scheduler};
use crate::cancellation::{CallScope, CancellationToken};
use crate::core::{IndependenceReport, PipelineResult, Table, TerminalState};
use crate::events::{EventKind, EventSink, NoOpEventSink};
use crate::execution::Executor;
use crate::planning::Planner;
use crate::retrieval::{HybridRetrieval, RetrievalRegistry};
use crate::services::{EmbeddingService, GenerationService};
use crate::utils::{generate_run_id, now_utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Builder for [`TableQaPipeline`].
pub struct TableQaPipelineBuilder {
    generator: Arc<dyn GenerationService>,
    embedder: Option<Arc<dyn EmbeddingService>>,
    options: PipelineOptions,
    events: Arc<dyn EventSink>,
    registry: Option<RetrievalRegistry>,
    token: Option<Arc<CancellationToken>>,
}

impl std::fmt::Debug for TableQaPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableQaPipelineBuilder")
            .field("has_embedder", &self.embedder.is_some())
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TableQaPipelineBuilder {
    fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self {
            generator,
            embedder: None,
            options: PipelineOptions::default(),
            events: Arc::new(NoOpEventSink),
            registry: None,
            token: None,
        }
    }

    /// Uses an embedding service for hybrid retrieval.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingService>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the standard keyword + hybrid registry.
    #[must_use]
    pub fn with_registry(mut self, registry: RetrievalRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shares a cancellation token with every run that is not given an
    /// explicit scope.
    #[must_use]
    pub fn with_cancellation_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.token = Some(token);
        self
    }

    /// Wires the planner, executor, scheduler and aggregator.
    #[must_use]
    pub fn build(self) -> TableQaPipeline {
        let options = self.options;
        let call_timeout = options.call_timeout();

        let registry = self.registry.unwrap_or_else(|| {
            let mut hybrid = HybridRetrieval::new()
                .with_options(options.retrieval.clone())
                .with_call_timeout(call_timeout);
            if let Some(embedder) = self.embedder {
                hybrid = hybrid.with_embedder(embedder);
            }
            RetrievalRegistry::standard(hybrid)
        });

        let planner = Planner::new(self.generator.clone())
            .with_params(options.planner)
            .with_call_timeout(call_timeout);

        let executor = Executor::new(self.generator.clone())
            .with_registry(Arc::new(registry))
            .with_params(options.executor)
            .with_top_k(options.retrieval_top_k)
            .with_table_rows(options.execution_table_rows)
            .with_max_snippets(options.max_snippets_in_prompt)
            .with_call_timeout(call_timeout);

        let scheduler = Scheduler::new(planner, executor)
            .with_max_iterations(options.max_iterations)
            .with_event_sink(self.events.clone());

        let aggregator = Aggregator::new(self.generator.clone())
            .with_params(options.aggregator)
            .with_call_timeout(call_timeout);

        TableQaPipeline {
            generator: self.generator,
            scheduler,
            aggregator,
            options,
            events: self.events,
            token: self.token,
        }
    }
}

/// Answers questions over tables.
///
/// Both modes are infallible: every failure is folded into the returned
/// [`PipelineResult`].
#[derive(Clone)]
pub struct TableQaPipeline {
    generator: Arc<dyn GenerationService>,
    scheduler: Scheduler,
    aggregator: Aggregator,
    options: PipelineOptions,
    events: Arc<dyn EventSink>,
    token: Option<Arc<CancellationToken>>,
}

impl std::fmt::Debug for TableQaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableQaPipeline")
            .field("scheduler", &self.scheduler)
            .field("aggregator", &self.aggregator)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TableQaPipeline {
    /// Starts building a pipeline around a generation service.
    #[must_use]
    pub fn builder(generator: Arc<dyn GenerationService>) -> TableQaPipelineBuilder {
        TableQaPipelineBuilder::new(generator)
    }

    /// Returns the options the pipeline was built with.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Creates the scope used when no explicit one is given.
    #[must_use]
    pub fn default_scope(&self) -> CallScope {
        match &self.token {
            Some(token) => CallScope::new().with_token(token.clone()),
            None => CallScope::new(),
        }
    }

    /// Answers with iterative decomposition.
    pub async fn process_question(&self, question: &str, table: &Table) -> PipelineResult {
        self.process_question_with_scope(question, table, &self.default_scope())
            .await
    }

    /// Answers with iterative decomposition under an explicit scope.
    pub async fn process_question_with_scope(
        &self,
        question: &str,
        table: &Table,
        scope: &CallScope,
    ) -> PipelineResult {
        let run_id = generate_run_id();
        let started_at = now_utc();
        info!(%run_id, question = %preview(question), "Processing question");
        self.events
            .emit(
                EventKind::PipelineStarted.as_str(),
                Some(json!({ "run_id": run_id, "mode": "iterative" })),
            )
            .await;

        let run = self.scheduler.run(question, table, scope).await;
        let final_answer = self.aggregator.aggregate(&run.results, scope).await;

        let result = PipelineResult {
            run_id,
            question: question.to_string(),
            strategy: run.strategy.to_string(),
            iterations: run.iterations,
            subtasks: run.subtasks,
            subtask_results: run.results,
            final_answer,
            context: run.context.snapshot(),
            independence: run.independence,
            terminal_state: run.terminal_state,
            started_at,
            ended_at: now_utc(),
        };
        self.finish(&result).await;
        result
    }

    /// Answers with one generation call and canonicalizes the output to
    /// the `<answer>` wire format.
    pub async fn process_question_simple(&self, question: &str, table: &Table) -> PipelineResult {
        self.process_question_simple_with_scope(question, table, &self.default_scope())
            .await
    }

    /// Single-shot mode under an explicit scope.
    pub async fn process_question_simple_with_scope(
        &self,
        question: &str,
        table: &Table,
        scope: &CallScope,
    ) -> PipelineResult {
        let run_id = generate_run_id();
        let started_at = now_utc();
        info!(%run_id, question = %preview(question), "Processing question in single-shot mode");
        self.events
            .emit(
                EventKind::PipelineStarted.as_str(),
                Some(json!({ "run_id": run_id, "mode": "single_shot" })),
            )
            .await;

        let final_answer = answer_single_shot(
            self.generator.as_ref(),
            question,
            table,
            self.options.single_shot,
            self.options.execution_table_rows,
            scope,
            self.options.call_timeout(),
        )
        .await;

        let terminal_state = if scope.interruption().is_some() {
            TerminalState::Cancelled
        } else {
            TerminalState::Completed
        };

        let result = PipelineResult {
            run_id,
            question: question.to_string(),
            strategy: END_TO_END_STRATEGY.to_string(),
            iterations: 1,
            subtasks: Vec::new(),
            subtask_results: Vec::new(),
            final_answer,
            context: Vec::new(),
            independence: IndependenceReport::valid(),
            terminal_state,
            started_at,
            ended_at: now_utc(),
        };
        self.finish(&result).await;
        result
    }

    async fn finish(&self, result: &PipelineResult) {
        info!(
            run_id = %result.run_id,
            strategy = %result.strategy,
            iterations = result.iterations,
            terminal_state = %result.terminal_state,
            duration_ms = result.duration_ms(),
            "Question processed"
        );
        self.events
            .emit(
                EventKind::PipelineCompleted.as_str(),
                Some(json!({
                    "run_id": result.run_id,
                    "strategy": result.strategy,
                    "iterations": result.iterations,
                    "terminal_state": result.terminal_state,
                    "duration_ms": result.duration_ms(),
                })),
            )
            .await;
    }
}

fn preview(question: &str) -> String {
    question.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::testing::{cyclones_table, league_table, KeywordEmbedder, ScriptedGenerator};
    use pretty_assertions::assert_eq;

    const QUESTION: &str = "What is the average number of cyclones per season?";

    #[tokio::test]
    async fn test_single_shot_cyclones() {
        let generator = Arc::new(ScriptedGenerator::new().with_default("7.67"));
        let pipeline = TableQaPipeline::builder(generator.clone()).build();

        let result = pipeline
            .process_question_simple(QUESTION, &cyclones_table())
            .await;

        assert_eq!(result.final_answer, "<answer>\n7.67\n</answer>");
        assert_eq!(result.strategy, "end_to_end");
        assert_eq!(result.iterations, 1);
        assert!(result.subtasks.is_empty());
        assert!(result.subtask_results.is_empty());
        assert_eq!(result.terminal_state, TerminalState::Completed);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_iterative_with_fallback_plan() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Reply with JSON only", "no plan")
                .respond_when("Task type: independent", "10, 10, 3")
                .respond_when("Task type: aggregate", "7.67")
                .with_default("The average is 7.67"),
        );
        let events = Arc::new(CollectingEventSink::new());
        let pipeline = TableQaPipeline::builder(generator.clone())
            .with_event_sink(events.clone())
            .build();

        let result = pipeline.process_question(QUESTION, &cyclones_table()).await;

        assert_eq!(result.strategy, "aggregation");
        assert_eq!(result.terminal_state, TerminalState::Completed);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.final_answer, "The average is 7.67");
        assert_eq!(
            result.context,
            vec![
                ("task_1".to_string(), "10, 10, 3".to_string()),
                ("task_2".to_string(), "7.67".to_string()),
            ]
        );
        assert!(result.ended_at >= result.started_at);

        let types = events.event_types();
        assert_eq!(types.first().map(String::as_str), Some("pipeline.started"));
        assert_eq!(types.last().map(String::as_str), Some("pipeline.completed"));
        assert_eq!(events.count("plan.fallback"), 1);
    }

    #[tokio::test]
    async fn test_options_flow_into_calls() {
        let generator = Arc::new(ScriptedGenerator::new().with_default("x"));
        let options = PipelineOptions::new()
            .with_max_iterations(1)
            .with_planner_params(crate::services::GenerationParams::new(100, 0.0))
            .with_executor_params(crate::services::GenerationParams::new(50, 0.0));
        let pipeline = TableQaPipeline::builder(generator.clone())
            .with_options(options)
            .build();

        pipeline.process_question("List each team", &league_table()).await;

        let requests = generator.requests();
        assert_eq!(requests[0].max_tokens, 100);
        assert_eq!(requests[1].max_tokens, 50);
    }

    #[tokio::test]
    async fn test_embedder_reaches_retrieval() {
        let embedder = Arc::new(KeywordEmbedder::new(&["leeds"]));
        let generator = Arc::new(ScriptedGenerator::new().with_default("Rovers"));
        let pipeline = TableQaPipeline::builder(generator)
            .with_embedder(embedder.clone())
            .with_options(PipelineOptions::new().with_max_iterations(1))
            .build();

        let result = pipeline.process_question("List each team", &league_table()).await;

        assert!(embedder.call_count() > 0);
        assert_eq!(result.final_answer, "Rovers");
    }

    #[tokio::test]
    async fn test_shared_token_cancels_runs() {
        let token = Arc::new(CancellationToken::new());
        let generator = Arc::new(ScriptedGenerator::new().with_default("7.67"));
        let pipeline = TableQaPipeline::builder(generator.clone())
            .with_cancellation_token(token.clone())
            .build();

        token.cancel("shutting down");
        let iterative = pipeline.process_question(QUESTION, &cyclones_table()).await;
        let single = pipeline.process_question_simple(QUESTION, &cyclones_table()).await;

        assert_eq!(iterative.terminal_state, TerminalState::Cancelled);
        assert_eq!(
            iterative.final_answer,
            crate::pipeline::NO_RESULTS_ANSWER
        );
        assert_eq!(single.terminal_state, TerminalState::Cancelled);
        assert!(single.final_answer.contains("cancelled"));
        assert_eq!(generator.call_count(), 0);
    }
}
