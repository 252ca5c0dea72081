//! Scoring parameters for hybrid retrieval.

use serde::{Deserialize, Serialize};

/// Weights applied when fusing lexical and dense scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Weight of the lexical score.
    pub bm25: f64,
    /// Weight of the dense (or overlap) score.
    pub dense: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            bm25: default_bm25_weight(),
            dense: default_dense_weight(),
        }
    }
}

impl FusionWeights {
    /// Creates weights.
    #[must_use]
    pub const fn new(bm25: f64, dense: f64) -> Self {
        Self { bm25, dense }
    }

    /// Fuses two scores. With non-negative weights the result is
    /// non-decreasing in each input.
    #[must_use]
    pub fn combine(&self, bm25: f64, dense: f64) -> f64 {
        self.bm25 * bm25 + self.dense * dense
    }
}

/// Configuration for the hybrid method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOptions {
    /// Weight of the lexical score.
    #[serde(default = "default_bm25_weight")]
    pub bm25_weight: f64,
    /// Weight of the dense score.
    #[serde(default = "default_dense_weight")]
    pub dense_weight: f64,
    /// Minimum cosine similarity for an embedding match.
    #[serde(default = "default_embedding_threshold")]
    pub embedding_threshold: f64,
    /// Minimum token overlap when no embedder is available.
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,
}

fn default_bm25_weight() -> f64 {
    0.3
}

fn default_dense_weight() -> f64 {
    0.7
}

fn default_embedding_threshold() -> f64 {
    0.3
}

fn default_overlap_threshold() -> f64 {
    0.2
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            bm25_weight: default_bm25_weight(),
            dense_weight: default_dense_weight(),
            embedding_threshold: default_embedding_threshold(),
            overlap_threshold: default_overlap_threshold(),
        }
    }
}

impl RetrievalOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fusion weights.
    #[must_use]
    pub fn with_weights(mut self, bm25: f64, dense: f64) -> Self {
        self.bm25_weight = bm25;
        self.dense_weight = dense;
        self
    }

    /// Sets the embedding similarity threshold.
    #[must_use]
    pub fn with_embedding_threshold(mut self, threshold: f64) -> Self {
        self.embedding_threshold = threshold;
        self
    }

    /// Sets the token-overlap threshold.
    #[must_use]
    pub fn with_overlap_threshold(mut self, threshold: f64) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    /// Returns the fusion weights.
    #[must_use]
    pub fn weights(&self) -> FusionWeights {
        FusionWeights::new(self.bm25_weight, self.dense_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RetrievalOptions::default();
        assert_eq!(options.weights(), FusionWeights::new(0.3, 0.7));
        assert!((options.embedding_threshold - 0.3).abs() < f64::EPSILON);
        assert!((options.overlap_threshold - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let options: RetrievalOptions = serde_json::from_str(r#"{"dense_weight": 0.5}"#).unwrap();
        assert!((options.dense_weight - 0.5).abs() < f64::EPSILON);
        assert!((options.bm25_weight - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_combine() {
        let weights = FusionWeights::default();
        assert!((weights.combine(1.0, 0.0) - 0.3).abs() < 1e-12);
        assert!((weights.combine(0.0, 1.0) - 0.7).abs() < 1e-12);
        assert!((weights.combine(0.5, 0.5) - 0.5).abs() < 1e-12);
    }
}
