//! Error types for the table question-answering engine.
//!
//! Most of the engine degrades instead of failing: plan-parse failures fall
//! back to templates, sub-task failures become result statuses, and
//! aggregation falls back to a manual listing. The types here describe the
//! failures that do travel through `Result`s internally.

use std::collections::HashMap;
use thiserror::Error;

/// The error type for the fallible entry points: table loading, option
/// loading and accuracy scoring.
#[derive(Debug, Error)]
pub enum TableQaError {
    /// The input table could not be interpreted.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Paired lists had different lengths.
    #[error("Got {predictions} predictions for {references} references")]
    LengthMismatch {
        /// Number of predictions.
        predictions: usize,
        /// Number of references.
        references: usize,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TableQaError {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let kind = match self {
            Self::InvalidTable(_) => "InvalidTable",
            Self::LengthMismatch { .. } => "LengthMismatch",
            Self::Serialization(_) => "Serialization",
        };
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised by a generation collaborator call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    /// The collaborator reported a failure.
    #[error("Generation failed: {reason}")]
    Failed {
        /// The reason for failure.
        reason: String,
    },

    /// The call was cancelled through its scope.
    #[error("Generation cancelled: {reason}")]
    Cancelled {
        /// The cancellation reason.
        reason: String,
    },

    /// The call did not finish before its deadline.
    #[error("Generation timed out after {elapsed_ms}ms")]
    Timeout {
        /// Time spent before giving up.
        elapsed_ms: u64,
    },
}

impl GenerationError {
    /// Creates a failed error.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Creates a cancelled error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Returns true if the error came from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Failed { reason } => {
                map.insert("type".to_string(), serde_json::json!("GenerationFailed"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Cancelled { reason } => {
                map.insert("type".to_string(), serde_json::json!("GenerationCancelled"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Timeout { elapsed_ms } => {
                map.insert("type".to_string(), serde_json::json!("GenerationTimeout"));
                map.insert("elapsed_ms".to_string(), serde_json::json!(elapsed_ms));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised by retrieval methods and the registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    /// No method is registered under this name.
    #[error("Unknown retrieval method: {name}")]
    UnknownMethod {
        /// The requested method name.
        name: String,
    },

    /// The embedding collaborator failed.
    #[error("Embedding failed: {reason}")]
    Embedding {
        /// The reason for failure.
        reason: String,
    },

    /// A method failed while scoring.
    #[error("Retrieval method '{name}' failed: {reason}")]
    MethodFailed {
        /// The method name.
        name: String,
        /// The reason for failure.
        reason: String,
    },
}

impl RetrievalError {
    /// Creates an unknown method error.
    #[must_use]
    pub fn unknown_method(name: impl Into<String>) -> Self {
        Self::UnknownMethod { name: name.into() }
    }

    /// Creates an embedding error.
    #[must_use]
    pub fn embedding(reason: impl Into<String>) -> Self {
        Self::Embedding {
            reason: reason.into(),
        }
    }

    /// Creates a method failure error.
    #[must_use]
    pub fn method_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MethodFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::UnknownMethod { name } => {
                map.insert("type".to_string(), serde_json::json!("UnknownRetrievalMethod"));
                map.insert("name".to_string(), serde_json::json!(name));
            }
            Self::Embedding { reason } => {
                map.insert("type".to_string(), serde_json::json!("EmbeddingFailed"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::MethodFailed { name, reason } => {
                map.insert("type".to_string(), serde_json::json!("RetrievalMethodFailed"));
                map.insert("name".to_string(), serde_json::json!(name));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Why a planner response could not be turned into a graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanParseError {
    /// No candidate JSON span was found in the response.
    #[error("No JSON object found in planner response")]
    NoJson,

    /// Candidates were found but none matched the graph schema.
    #[error("Planner response did not match the graph schema: {0}")]
    Schema(String),

    /// The graph parsed but holds no sub-tasks.
    #[error("Planner returned a graph without sub-tasks")]
    Empty,
}
