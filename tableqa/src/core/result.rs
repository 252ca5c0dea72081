//! Per-sub-task and per-question results.

use super::SubTask;
use crate::retrieval::RetrievalResult;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The outcome of dispatching one sub-task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    /// Generation succeeded and the result joined the context.
    Success,
    /// Generation failed.
    Error,
    /// Dependencies were not yet satisfied, so the sub-task did not run.
    Pending,
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// The record of one sub-task dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskResult {
    /// The sub-task id.
    pub task_id: String,
    /// The outcome.
    pub status: SubtaskStatus,
    /// Generated text (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error message (error only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The sub-task's reasoning steps, echoed for inspection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning: Vec<String>,
    /// Snippets gathered while executing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieval_results: Vec<RetrievalResult>,
}

impl SubtaskResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(task_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: SubtaskStatus::Success,
            result: Some(result.into()),
            error: None,
            reasoning: Vec::new(),
            retrieval_results: Vec::new(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn error(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: SubtaskStatus::Error,
            result: None,
            error: Some(error.into()),
            reasoning: Vec::new(),
            retrieval_results: Vec::new(),
        }
    }

    /// Creates a result for a sub-task whose dependencies are not ready.
    #[must_use]
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: SubtaskStatus::Pending,
            result: None,
            error: None,
            reasoning: vec!["waiting for dependencies".to_string()],
            retrieval_results: Vec::new(),
        }
    }

    /// Attaches the sub-task's reasoning steps.
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: Vec<String>) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// Attaches retrieval snippets.
    #[must_use]
    pub fn with_retrieval(mut self, results: Vec<RetrievalResult>) -> Self {
        self.retrieval_results = results;
        self
    }

    /// Returns true if the status is success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SubtaskStatus::Success
    }
}

/// Outcome of the structural independence check on one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndependenceReport {
    /// True iff no issues were found.
    pub valid: bool,
    /// Human-readable issues, one per offending sub-task.
    pub issues: Vec<String>,
}

impl IndependenceReport {
    /// Creates a report from a list of issues.
    #[must_use]
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// A report with no issues.
    #[must_use]
    pub fn valid() -> Self {
        Self::from_issues(Vec::new())
    }
}

/// How the iterative loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// Every dispatched sub-task in the last round succeeded.
    Completed,
    /// The last round made no progress.
    Stalled,
    /// The round limit was reached.
    Exhausted,
    /// The call scope was cancelled or ran past its deadline.
    Cancelled,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Stalled => write!(f, "stalled"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything produced while answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// The question asked.
    pub question: String,
    /// Strategy of the final round, or `end_to_end` for single-shot mode.
    pub strategy: String,
    /// Number of rounds run.
    pub iterations: usize,
    /// Every sub-task planned, across rounds.
    pub subtasks: Vec<SubTask>,
    /// Every dispatch record, across rounds.
    pub subtask_results: Vec<SubtaskResult>,
    /// The final answer text.
    pub final_answer: String,
    /// Final context snapshot, in insertion order.
    pub context: Vec<(String, String)>,
    /// Validator outcome for the final round's graph.
    pub independence: IndependenceReport,
    /// How the loop ended.
    pub terminal_state: TerminalState,
    /// When processing started.
    pub started_at: Timestamp,
    /// When processing ended.
    pub ended_at: Timestamp,
}

impl PipelineResult {
    /// Number of successful dispatches across all rounds.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.subtask_results.iter().filter(|r| r.is_success()).count()
    }

    /// Whether every recorded dispatch succeeded and at least one exists.
    #[must_use]
    pub fn all_subtasks_succeeded(&self) -> bool {
        !self.subtask_results.is_empty() && self.success_count() == self.subtask_results.len()
    }

    /// Wall-clock processing time in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_result_constructors() {
        let ok = SubtaskResult::success("task_1", "42");
        assert!(ok.is_success());
        assert_eq!(ok.result.as_deref(), Some("42"));
        assert!(ok.error.is_none());

        let err = SubtaskResult::error("task_2", "boom");
        assert_eq!(err.status, SubtaskStatus::Error);
        assert_eq!(err.error.as_deref(), Some("boom"));

        let pending = SubtaskResult::pending("task_3");
        assert_eq!(pending.status, SubtaskStatus::Pending);
        assert!(pending.result.is_none());
    }

    #[test]
    fn test_subtask_result_serialization_omits_empty() {
        let json = serde_json::to_value(SubtaskResult::success("task_1", "7")).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("error").is_none());
        assert!(json.get("retrieval_results").is_none());
    }

    #[test]
    fn test_independence_report() {
        assert!(IndependenceReport::valid().valid);

        let report = IndependenceReport::from_issues(vec!["bad".to_string()]);
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SubtaskStatus::Pending.to_string(), "pending");
        assert_eq!(TerminalState::Stalled.to_string(), "stalled");
    }
}
