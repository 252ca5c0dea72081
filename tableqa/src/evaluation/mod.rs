//! Answer scoring and batch evaluation.
//!
//! This module provides:
//! - [`AnswerComparator`] for exact-match and `<answer>` format scores
//! - [`evaluate`] to run a pipeline over labelled samples

mod comparator;
mod runner;

pub use comparator::{AccuracyReport, AnswerComparator};
pub use runner::{evaluate, EvaluationMode, EvaluationReport, EvaluationSample};
