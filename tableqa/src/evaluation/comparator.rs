//! Exact-match and format scoring of predicted answers.

use crate::errors::TableQaError;
use crate::pipeline::{extract_answer, has_answer_format};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Aggregate scores over a batch of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Number of scored pairs.
    pub total_samples: usize,
    /// Pairs whose extracted answer matched the reference.
    pub exact_match_count: usize,
    /// Predictions carrying an `<answer>` span.
    pub format_correct_count: usize,
    /// `exact_match_count / total_samples`, or 0.0 when empty.
    pub exact_match_accuracy: f64,
    /// `format_correct_count / total_samples`, or 0.0 when empty.
    pub format_accuracy: f64,
}

/// Compares predictions against reference answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerComparator;

impl AnswerComparator {
    /// Creates a comparator.
    pub fn new() -> Self {
        Self
    }

    /// Lower-cases, drops punctuation and collapses whitespace.
    pub fn normalize(answer: &str) -> String {
        let lowered = answer.trim().to_lowercase();
        let stripped = PUNCTUATION.replace_all(&lowered, "");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 1.0 when both answers normalize to the same text, else 0.0.
    pub fn exact_match(&self, prediction: &str, reference: &str) -> f64 {
        if Self::normalize(prediction) == Self::normalize(reference) {
            1.0
        } else {
            0.0
        }
    }

    /// 1.0 when the text contains a complete `<answer>` span, else 0.0.
    pub fn format_score(&self, text: &str) -> f64 {
        if has_answer_format(text) {
            1.0
        } else {
            0.0
        }
    }

    /// Scores paired predictions and references.
    ///
    /// Each prediction is reduced to its `<answer>` content before the
    /// exact-match comparison; the format score looks at the raw text.
    pub fn accuracy(
        &self,
        predictions: &[String],
        references: &[String],
    ) -> Result<AccuracyReport, TableQaError> {
        if predictions.len() != references.len() {
            return Err(TableQaError::LengthMismatch {
                predictions: predictions.len(),
                references: references.len(),
            });
        }

        Ok(self.score_pairs(predictions.iter().zip(references)))
    }

    /// Scores already-paired predictions and references.
    pub(crate) fn score_pairs<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> AccuracyReport {
        let mut total_samples = 0;
        let mut exact_match_count = 0;
        let mut format_correct_count = 0;
        for (prediction, reference) in pairs {
            total_samples += 1;
            if self.exact_match(&extract_answer(prediction), reference) > 0.0 {
                exact_match_count += 1;
            }
            if self.format_score(prediction) > 0.0 {
                format_correct_count += 1;
            }
        }

        AccuracyReport {
            total_samples,
            exact_match_count,
            format_correct_count,
            exact_match_accuracy: ratio(exact_match_count, total_samples),
            format_accuracy: ratio(format_correct_count, total_samples),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
