//! Answering with one generation call and no decomposition.

use super::aggregator::strip_prompt_echo;
use super::answer::canonicalize_answer;
use crate::cancellation::CallScope;
use crate::core::Table;
use crate::services::{generate_scoped, GenerationParams, GenerationRequest, GenerationService};
use std::time::Duration;
use tracing::{debug, warn};

/// Strategy name recorded for single-shot runs.
pub const END_TO_END_STRATEGY: &str = "end_to_end";

/// Prefix of the final answer when the single call fails.
pub const SINGLE_SHOT_FAILURE: &str = "Sorry, this question could not be processed";

const ASSISTANT_MARKER: &str = "<|im_start|>assistant";

/// Builds the chat-formatted prompt: one user turn with the table and the
/// question, then an open assistant turn.
#[must_use]
pub fn single_shot_prompt(question: &str, table: &Table, table_rows: usize) -> String {
    format!(
        "<|im_start|>user\nTable:\n{}\n\nQuestion: {question}\n<|im_end|>\n{ASSISTANT_MARKER}\n",
        table.render(table_rows)
    )
}

/// Reduces decoded output to the assistant's reply.
///
/// Takes the text after the last assistant marker, else strips an echoed
/// prompt, else keeps the whole output.
#[must_use]
pub fn assistant_reply<'a>(output: &'a str, prompt: &str) -> &'a str {
    if let Some(pos) = output.rfind(ASSISTANT_MARKER) {
        return output[pos + ASSISTANT_MARKER.len()..].trim();
    }
    strip_prompt_echo(output, prompt)
}

/// Runs single-shot mode and returns the final answer text. Never fails.
pub(crate) async fn answer_single_shot(
    generator: &dyn GenerationService,
    question: &str,
    table: &Table,
    params: GenerationParams,
    table_rows: usize,
    scope: &CallScope,
    call_timeout: Option<Duration>,
) -> String {
    let prompt = single_shot_prompt(question, table, table_rows);
    let request = GenerationRequest::new(prompt, params);

    match generate_scoped(generator, &request, scope, call_timeout).await {
        Ok(output) => {
            let answer = canonicalize_answer(assistant_reply(&output, &request.prompt));
            debug!(answer = %answer, "Single-shot answer");
            answer
        }
        Err(e) => {
            warn!(error = %e, "Single-shot generation failed");
            format!("{SINGLE_SHOT_FAILURE}: {e}")
        }
    }
}
