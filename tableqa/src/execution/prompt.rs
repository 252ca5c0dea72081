//! Prompt text for executing one sub-task.

use crate::context::ExecutionContext;
use crate::core::{SubTask, Table};
use crate::retrieval::RetrievalResult;

/// Heading for accumulated results in execution prompts.
pub const EXECUTION_CONTEXT_HEADING: &str = "Relevant context";

/// Builds the execution prompt for a sub-task.
///
/// The table is shown with at most `table_rows` literal rows, followed by
/// the context, the first `max_snippets` retrieval snippets with their
/// scores, and the sub-task itself.
#[must_use]
pub fn execution_prompt(
    subtask: &SubTask,
    table: &Table,
    context: &ExecutionContext,
    snippets: &[RetrievalResult],
    table_rows: usize,
    max_snippets: usize,
) -> String {
    let mut retrieved = String::new();
    if !snippets.is_empty() && max_snippets > 0 {
        retrieved.push_str("\nRetrieved data:\n");
        for (i, snippet) in snippets.iter().take(max_snippets).enumerate() {
            retrieved.push_str(&format!(
                "{}. {} (score: {:.3})\n",
                i + 1,
                snippet.content,
                snippet.score
            ));
        }
    }

    let steps: Vec<String> = subtask
        .reasoning_steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect();

    format!(
        "\nTable:\n{}{}{retrieved}\n\nTask: {}\nTask type: {}\nExpected output: {}\n\nReasoning steps:\n{}\n\nCarry out this task and return the result:\n",
        table.render(table_rows),
        context.render(EXECUTION_CONTEXT_HEADING),
        subtask.description,
        subtask.task_type,
        subtask.expected_output,
        steps.join("\n"),
    )
}
