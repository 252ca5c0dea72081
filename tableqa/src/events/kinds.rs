//! Lifecycle events emitted while answering a question.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle points the scheduler reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Processing of a question began.
    #[serde(rename = "pipeline.started")]
    PipelineStarted,
    /// A planning round began.
    #[serde(rename = "round.started")]
    RoundStarted,
    /// The planner used its fallback template.
    #[serde(rename = "plan.fallback")]
    PlanFallback,
    /// The validator or DAG check found problems with a graph.
    #[serde(rename = "plan.validation_issues")]
    PlanValidationIssues,
    /// A sub-task succeeded.
    #[serde(rename = "subtask.completed")]
    SubtaskCompleted,
    /// A sub-task's generation call failed.
    #[serde(rename = "subtask.failed")]
    SubtaskFailed,
    /// A sub-task was skipped because its dependencies were missing.
    #[serde(rename = "subtask.pending")]
    SubtaskPending,
    /// A planning round finished.
    #[serde(rename = "round.completed")]
    RoundCompleted,
    /// Processing finished with a final answer.
    #[serde(rename = "pipeline.completed")]
    PipelineCompleted,
}

impl EventKind {
    /// Returns the dotted event type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline.started",
            Self::RoundStarted => "round.started",
            Self::PlanFallback => "plan.fallback",
            Self::PlanValidationIssues => "plan.validation_issues",
            Self::SubtaskCompleted => "subtask.completed",
            Self::SubtaskFailed => "subtask.failed",
            Self::SubtaskPending => "subtask.pending",
            Self::RoundCompleted => "round.completed",
            Self::PipelineCompleted => "pipeline.completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
