//! Batch evaluation of a pipeline over labelled samples.

use super::comparator::{ratio, AccuracyReport, AnswerComparator};
use crate::core::{PipelineResult, Table};
use crate::pipeline::TableQaPipeline;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// A question with its table and reference answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSample {
    /// The question.
    pub question: String,
    /// The table to answer over.
    pub table: Table,
    /// The reference answer.
    pub answer: String,
}

impl EvaluationSample {
    /// Creates a sample.
    pub fn new(question: impl Into<String>, table: Table, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            table,
            answer: answer.into(),
        }
    }
}

/// Which processing mode to evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Iterative decomposition.
    Iterative,
    /// One generation call per question.
    #[default]
    SingleShot,
}

/// Outcome of a batch evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// The mode that was evaluated.
    pub mode: EvaluationMode,
    /// Number of samples processed.
    pub total_samples: usize,
    /// Samples counted as successful executions.
    pub successful_executions: usize,
    /// Samples that were not.
    pub failed_executions: usize,
    /// `successful_executions / total_samples`.
    pub success_rate: f64,
    /// Mean wall-clock time per sample.
    pub avg_execution_time_ms: f64,
    /// Samples per recorded strategy.
    pub strategy_counts: BTreeMap<String, usize>,
    /// Final answers in sample order.
    pub predictions: Vec<String>,
    /// Reference answers in sample order.
    pub references: Vec<String>,
    /// Exact-match and format scores.
    pub accuracy: AccuracyReport,
}

fn execution_succeeded(result: &PipelineResult, mode: EvaluationMode) -> bool {
    match mode {
        EvaluationMode::SingleShot => !result.final_answer.trim().is_empty(),
        EvaluationMode::Iterative => result.all_subtasks_succeeded(),
    }
}

/// Runs every sample through `pipeline` in `mode` and scores the answers.
///
/// Pipeline runs never fail outright, so every sample yields exactly one
/// prediction.
pub async fn evaluate(
    pipeline: &TableQaPipeline,
    samples: &[EvaluationSample],
    mode: EvaluationMode,
) -> EvaluationReport {
    let mut successful_executions = 0;
    let mut total_ms = 0.0;
    let mut strategy_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut predictions = Vec::with_capacity(samples.len());
    let mut references = Vec::with_capacity(samples.len());

    for (index, sample) in samples.iter().enumerate() {
        let started = Instant::now();
        let result = match mode {
            EvaluationMode::Iterative => {
                pipeline
                    .process_question(&sample.question, &sample.table)
                    .await
            }
            EvaluationMode::SingleShot => {
                pipeline
                    .process_question_simple(&sample.question, &sample.table)
                    .await
            }
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        total_ms += elapsed_ms;

        let succeeded = execution_succeeded(&result, mode);
        if succeeded {
            successful_executions += 1;
        }
        debug!(
            sample = index + 1,
            total = samples.len(),
            succeeded,
            elapsed_ms,
            "Evaluated sample"
        );

        *strategy_counts.entry(result.strategy.clone()).or_default() += 1;
        predictions.push(result.final_answer);
        references.push(sample.answer.clone());
    }

    let accuracy = AnswerComparator::new().score_pairs(predictions.iter().zip(&references));
    let total_samples = samples.len();
    #[allow(clippy::cast_precision_loss)]
    let avg_execution_time_ms = if total_samples == 0 {
        0.0
    } else {
        total_ms / total_samples as f64
    };

    info!(
        total_samples,
        successful_executions,
        exact_match_accuracy = accuracy.exact_match_accuracy,
        format_accuracy = accuracy.format_accuracy,
        "Evaluation finished"
    );

    EvaluationReport {
        mode,
        total_samples,
        successful_executions,
        failed_executions: total_samples - successful_executions,
        success_rate: ratio(successful_executions, total_samples),
        avg_execution_time_ms,
        strategy_counts,
        predictions,
        references,
        accuracy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cyclones_table, league_table, ScriptedGenerator};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_shot_evaluation() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond_when("cyclones", "The average is 7.67")
                .with_default("<answer>Leeds</answer>"),
        );
        let pipeline = TableQaPipeline::builder(generator).build();
        let samples = vec![
            EvaluationSample::new(
                "What is the average number of cyclones per season?",
                cyclones_table(),
                "7.67",
            ),
            EvaluationSample::new("Which city do Athletic play in?", league_table(), "York"),
        ];

        let report = evaluate(&pipeline, &samples, EvaluationMode::SingleShot).await;

        assert_eq!(report.total_samples, 2);
        assert_eq!(report.accuracy.total_samples, report.predictions.len());
        assert_eq!(report.successful_executions, 2);
        assert_eq!(report.failed_executions, 0);
        assert_eq!(report.success_rate, 1.0);
        assert_eq!(report.strategy_counts.get("end_to_end"), Some(&2));
        assert_eq!(report.predictions[0], "<answer>\n7.67\n</answer>");
        assert_eq!(report.accuracy.exact_match_count, 1);
        assert_eq!(report.accuracy.format_correct_count, 2);
    }

    #[tokio::test]
    async fn test_iterative_evaluation_counts_failures() {
        let generator = Arc::new(ScriptedGenerator::new().failing("model offline"));
        let pipeline = TableQaPipeline::builder(generator).build();
        let samples = vec![EvaluationSample::new(
            "What is the total wins?",
            league_table(),
            "37",
        )];

        let report = evaluate(&pipeline, &samples, EvaluationMode::Iterative).await;

        assert_eq!(report.successful_executions, 0);
        assert_eq!(report.failed_executions, 1);
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.strategy_counts.get("aggregation"), Some(&1));
        assert_eq!(report.accuracy.exact_match_count, 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = TableQaPipeline::builder(Arc::new(ScriptedGenerator::new())).build();
        let report = evaluate(&pipeline, &[], EvaluationMode::Iterative).await;
        assert_eq!(report.total_samples, 0);
        assert_eq!(report.avg_execution_time_ms, 0.0);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn test_sample_deserializes_numeric_cells() {
        let sample: EvaluationSample = serde_json::from_str(
            r#"{"question": "q", "table": {"columns": ["a"], "data": [[1]]}, "answer": "1"}"#,
        )
        .unwrap();
        assert_eq!(sample.table.rows, vec![vec!["1".to_string()]]);
    }
}
