//! Assertions over pipeline results.

use crate::core::{PipelineResult, SubtaskStatus, TerminalState};
use crate::pipeline::has_answer_format;
use std::collections::HashSet;

/// Asserts that the run ended in the expected state.
pub fn assert_terminal_state(result: &PipelineResult, expected: TerminalState) {
    assert_eq!(
        result.terminal_state, expected,
        "Expected terminal state {:?}, got {:?} after {} rounds",
        expected, result.terminal_state, result.iterations
    );
}

/// Asserts that the final answer carries exactly one answer span.
pub fn assert_answer_format(result: &PipelineResult) {
    assert!(
        has_answer_format(&result.final_answer),
        "Expected an <answer> span, got: {:?}",
        result.final_answer
    );
}

/// Asserts that no sub-task ran before all of its dependencies had
/// succeeded earlier in the same run.
///
/// Relies on `subtasks` and `subtask_results` being parallel lists.
pub fn assert_dependencies_respected(result: &PipelineResult) {
    assert_eq!(
        result.subtasks.len(),
        result.subtask_results.len(),
        "Expected one result per planned sub-task"
    );

    let mut completed: HashSet<&str> = HashSet::new();
    for (task, outcome) in result.subtasks.iter().zip(&result.subtask_results) {
        if outcome.status != SubtaskStatus::Pending {
            for dep in &task.dependencies {
                assert!(
                    completed.contains(dep.as_str()),
                    "Sub-task {} ran before its dependency {}",
                    task.id,
                    dep
                );
            }
        }
        if outcome.status == SubtaskStatus::Success {
            completed.insert(task.id.as_str());
        }
    }
}
