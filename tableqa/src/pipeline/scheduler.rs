//! The bounded plan-then-execute loop.

use crate::cancellation::CallScope;
use crate::context::ExecutionContext;
use crate::core::{IndependenceReport, Strategy, SubTask, SubtaskResult, Table, TerminalState};
use crate::events::{EventKind, EventSink, NoOpEventSink};
use crate::execution::Executor;
use crate::planning::{IndependenceValidator, PlanOutcome, Planner};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the loop produced for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerRun {
    /// Strategy of the last round.
    pub strategy: Strategy,
    /// Rounds run.
    pub iterations: usize,
    /// Sub-tasks of every round, in order.
    pub subtasks: Vec<SubTask>,
    /// One record per sub-task in `subtasks`.
    pub results: Vec<SubtaskResult>,
    /// The final context.
    pub context: ExecutionContext,
    /// Validator outcome of the last round's graph.
    pub independence: IndependenceReport,
    /// How the loop ended.
    pub terminal_state: TerminalState,
}

/// Drives planning and execution rounds for one question.
///
/// Each round re-plans with the context accumulated so far, then walks the
/// graph in listed order, running every sub-task whose dependencies are all
/// in the context. The loop ends when a round completes every dispatched
/// sub-task, when a round completes none, when the scope is interrupted, or
/// after `max_iterations` rounds.
#[derive(Clone)]
pub struct Scheduler {
    planner: Planner,
    executor: Executor,
    validator: IndependenceValidator,
    events: Arc<dyn EventSink>,
    max_iterations: usize,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("planner", &self.planner)
            .field("executor", &self.executor)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler with a five-round limit and no event sink.
    #[must_use]
    pub fn new(planner: Planner, executor: Executor) -> Self {
        Self {
            planner,
            executor,
            validator: IndependenceValidator::new(),
            events: Arc::new(NoOpEventSink),
            max_iterations: 5,
        }
    }

    /// Sets the round limit.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs the loop. Never fails.
    pub async fn run(&self, question: &str, table: &Table, scope: &CallScope) -> SchedulerRun {
        let summary = table.summary();
        let mut run = SchedulerRun {
            strategy: Strategy::default(),
            iterations: 0,
            subtasks: Vec::new(),
            results: Vec::new(),
            context: ExecutionContext::new(),
            independence: IndependenceReport::valid(),
            terminal_state: TerminalState::Exhausted,
        };

        while run.iterations < self.max_iterations {
            run.iterations += 1;
            let round = run.iterations;
            self.emit(EventKind::RoundStarted, json!({ "round": round }));

            let outcome = self
                .planner
                .plan(question, &summary, &run.context, scope)
                .await;
            run.strategy = outcome.strategy;
            run.independence = self.check_plan(round, &outcome, &run.context);

            let round_results = self.dispatch(round, &outcome.graph.subtasks, table, &mut run.context, scope).await;

            let completed = round_results.iter().filter(|r| r.is_success()).count();
            let total = round_results.len();
            info!(round, completed, total, "Round finished");
            self.emit(
                EventKind::RoundCompleted,
                json!({ "round": round, "completed": completed, "total": total }),
            );

            run.subtasks.extend(outcome.graph.subtasks);
            run.results.extend(round_results);

            if completed == total && total > 0 {
                run.terminal_state = TerminalState::Completed;
                break;
            }
            if let Some(interruption) = scope.interruption() {
                warn!(round, reason = ?interruption, "Stopping after interrupted round");
                run.terminal_state = TerminalState::Cancelled;
                break;
            }
            if completed == 0 {
                warn!(round, "No sub-task completed, stopping");
                run.terminal_state = TerminalState::Stalled;
                break;
            }
        }

        run
    }

    fn check_plan(&self, round: usize, outcome: &PlanOutcome, context: &ExecutionContext) -> IndependenceReport {
        if let Some(reason) = &outcome.fallback_reason {
            self.emit(
                EventKind::PlanFallback,
                json!({ "round": round, "strategy": outcome.strategy.as_str(), "reason": reason }),
            );
        }

        let report = self.validator.validate(&outcome.graph.subtasks);

        // Earlier rounds' ids are legitimate dependencies.
        let mut dag = outcome.graph.check_dag();
        dag.unknown_dependencies.retain(|(_, dep)| !context.contains(dep));

        if !report.valid || !dag.is_clean() {
            let mut issues = report.issues.clone();
            issues.extend(dag.issues());
            warn!(round, issues = ?issues, "Plan has structural issues");
            self.emit(
                EventKind::PlanValidationIssues,
                json!({ "round": round, "issues": issues }),
            );
        }

        report
    }

    async fn dispatch(
        &self,
        round: usize,
        subtasks: &[SubTask],
        table: &Table,
        context: &mut ExecutionContext,
        scope: &CallScope,
    ) -> Vec<SubtaskResult> {
        let mut results = Vec::with_capacity(subtasks.len());

        for subtask in subtasks {
            if !context.satisfies(&subtask.dependencies) {
                debug!(round, task_id = %subtask.id, "Dependencies not ready");
                self.emit(
                    EventKind::SubtaskPending,
                    json!({ "round": round, "task_id": subtask.id }),
                );
                results.push(SubtaskResult::pending(&subtask.id));
                continue;
            }

            let result = self.executor.execute(subtask, table, context, scope).await;
            match (&result.result, result.is_success()) {
                (Some(text), true) => {
                    context.insert(&subtask.id, text.clone());
                    self.emit(
                        EventKind::SubtaskCompleted,
                        json!({ "round": round, "task_id": subtask.id }),
                    );
                }
                _ => {
                    self.emit(
                        EventKind::SubtaskFailed,
                        json!({ "round": round, "task_id": subtask.id, "error": result.error }),
                    );
                }
            }
            results.push(result);
        }

        results
    }

    fn emit(&self, kind: EventKind, data: serde_json::Value) {
        self.events.try_emit(kind.as_str(), Some(data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SubtaskStatus, TaskType};
    use crate::events::CollectingEventSink;
    use crate::testing::{cyclones_table, plan_response, ScriptedGenerator};
    use pretty_assertions::assert_eq;

    const QUESTION: &str = "What is the average number of cyclones per season?";

    fn scheduler(generator: Arc<ScriptedGenerator>) -> Scheduler {
        Scheduler::new(Planner::new(generator.clone()), Executor::new(generator))
    }

    #[tokio::test]
    async fn test_fallback_plan_completes_in_one_round() {
        // Unparseable plan, so the aggregation fallback runs.
        let generator = Arc::new(ScriptedGenerator::new().with_default("10, 10, 3"));
        let run = scheduler(generator.clone())
            .run(QUESTION, &cyclones_table(), &CallScope::new())
            .await;

        assert_eq!(run.terminal_state, TerminalState::Completed);
        assert_eq!(run.iterations, 1);
        assert_eq!(run.strategy, Strategy::Aggregation);
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.context.get("task_1"), Some("10, 10, 3"));
        assert!(run.context.contains("task_2"));
        assert!(run.independence.valid);
        // plan + two sub-tasks
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_out_of_order_plan_waits_for_dependencies() {
        let plan = plan_response(
            "aggregation",
            vec![
                SubTask::new("sum", "Average the counts", TaskType::Aggregate)
                    .with_dependencies(["extract"]),
                SubTask::new("extract", "Extract counts", TaskType::Independent),
            ],
        );
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Reply with JSON only", plan)
                .with_default("7.67"),
        );
        let events = Arc::new(CollectingEventSink::new());

        let run = scheduler(generator)
            .with_event_sink(events.clone())
            .run(QUESTION, &cyclones_table(), &CallScope::new())
            .await;

        // Round 1: sum pending, extract succeeds. Round 2: both succeed.
        assert_eq!(run.iterations, 2);
        assert_eq!(run.terminal_state, TerminalState::Completed);
        assert_eq!(run.results[0].status, SubtaskStatus::Pending);
        assert_eq!(run.results[1].status, SubtaskStatus::Success);
        assert_eq!(run.subtasks[2].id, "sum");
        assert_eq!(run.results[2].status, SubtaskStatus::Success);
        assert_eq!(events.count("round.started"), 2);
        assert_eq!(events.count("subtask.pending"), 1);
        assert_eq!(events.count("subtask.completed"), 3);
    }

    #[tokio::test]
    async fn test_unsatisfiable_dependencies_stall() {
        let plan = plan_response(
            "bridge",
            vec![
                SubTask::new("a", "first", TaskType::Bridge).with_dependencies(["b"]),
                SubTask::new("b", "second", TaskType::Bridge).with_dependencies(["a"]),
            ],
        );
        let generator = Arc::new(ScriptedGenerator::new().with_default(plan));
        let events = Arc::new(CollectingEventSink::new());

        let run = scheduler(generator.clone())
            .with_event_sink(events.clone())
            .run("Which team whose city is Leeds?", &cyclones_table(), &CallScope::new())
            .await;

        assert_eq!(run.terminal_state, TerminalState::Stalled);
        assert_eq!(run.iterations, 1);
        assert!(run.results.iter().all(|r| r.status == SubtaskStatus::Pending));
        assert_eq!(events.count("plan.validation_issues"), 1);
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_executor_stalls() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Reply with JSON only", "not json")
                .fail_when("Carry out this task", "model offline"),
        );
        let run = scheduler(generator)
            .run(QUESTION, &cyclones_table(), &CallScope::new())
            .await;

        assert_eq!(run.terminal_state, TerminalState::Stalled);
        assert_eq!(run.results[0].status, SubtaskStatus::Error);
        assert_eq!(run.results[1].status, SubtaskStatus::Pending);
        assert!(run.context.is_empty());
    }

    #[tokio::test]
    async fn test_partial_progress_exhausts_round_limit() {
        // Every round: task_1 succeeds, task_2 fails.
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("Reply with JSON only", "no plan")
                .fail_when("Task type: aggregate", "overloaded")
                .with_default("10, 10, 3"),
        );
        let run = scheduler(generator)
            .with_max_iterations(3)
            .run(QUESTION, &cyclones_table(), &CallScope::new())
            .await;

        assert_eq!(run.terminal_state, TerminalState::Exhausted);
        assert_eq!(run.iterations, 3);
        assert_eq!(run.results.len(), 6);
        assert_eq!(run.context.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_scope_stops_after_one_round() {
        let generator = Arc::new(ScriptedGenerator::new().with_default("x"));
        let scope = CallScope::new();
        scope.cancel("user");

        let run = scheduler(generator.clone())
            .run(QUESTION, &cyclones_table(), &scope)
            .await;

        assert_eq!(run.terminal_state, TerminalState::Cancelled);
        assert_eq!(run.iterations, 1);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_round_limit() {
        let generator = Arc::new(ScriptedGenerator::new());
        let run = scheduler(generator)
            .with_max_iterations(0)
            .run(QUESTION, &cyclones_table(), &CallScope::new())
            .await;

        assert_eq!(run.iterations, 0);
        assert_eq!(run.terminal_state, TerminalState::Exhausted);
        assert!(run.results.is_empty());
    }
}
