//! Structural independence check on a planned graph.

use crate::core::{IndependenceReport, SubTask, TaskType};

/// Checks that comparisons and bridge chains are wired up.
///
/// The check only reports; it never blocks execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependenceValidator;

impl IndependenceValidator {
    /// Creates a validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validates a list of sub-tasks.
    ///
    /// A compare task needs at least two dependencies. Every bridge task
    /// after the first one in list order needs at least one.
    #[must_use]
    pub fn validate(&self, subtasks: &[SubTask]) -> IndependenceReport {
        let mut issues = Vec::new();

        for task in subtasks.iter().filter(|t| t.task_type == TaskType::Compare) {
            if task.dependencies.len() < 2 {
                issues.push(format!(
                    "Compare task {} should depend on at least 2 independent tasks",
                    task.id
                ));
            }
        }

        for (i, task) in subtasks
            .iter()
            .filter(|t| t.task_type == TaskType::Bridge)
            .enumerate()
        {
            if i > 0 && task.dependencies.is_empty() {
                issues.push(format!(
                    "Bridge task {} should depend on the previous task",
                    task.id
                ));
            }
        }

        IndependenceReport::from_issues(issues)
    }
}
