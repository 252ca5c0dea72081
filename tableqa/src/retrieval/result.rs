//! Scored table-cell snippets returned by retrieval methods.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where a snippet came from and how it was scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMetadata {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub column_index: usize,
    /// Column name, or `col_{j}` past the header.
    pub column: String,
    /// Name of the method that produced the snippet.
    pub method: String,
    /// Query keywords found in the cell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords_matched: Vec<String>,
    /// Lexical score before fusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm25_score: Option<f64>,
    /// Dense or overlap score before fusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dense_score: Option<f64>,
    /// Fused score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f64>,
}

/// One scored cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Cell text.
    pub content: String,
    /// Method-specific relevance score.
    pub score: f64,
    /// Locator string such as `row_0_col_1`.
    pub source: String,
    /// Scoring details.
    pub metadata: RetrievalMetadata,
}

impl RetrievalResult {
    /// Creates a result.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        score: f64,
        source: impl Into<String>,
        metadata: RetrievalMetadata,
    ) -> Self {
        Self {
            content: content.into(),
            score,
            source: source.into(),
            metadata,
        }
    }
}

/// Sorts by descending score and keeps the first `top_k`.
///
/// The sort is stable, so equal scores keep table order.
pub(crate) fn rank(mut results: Vec<RetrievalResult>, top_k: usize) -> Vec<RetrievalResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(top_k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(content: &str, score: f64) -> RetrievalResult {
        RetrievalResult::new(content, score, "row_0_col_0", RetrievalMetadata::default())
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let ranked = rank(
            vec![result("a", 0.2), result("b", 0.9), result("c", 0.5)],
            2,
        );
        let contents: Vec<_> = ranked.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }

    #[test]
    fn test_rank_stable_on_ties() {
        let ranked = rank(vec![result("first", 0.5), result("second", 0.5)], 5);
        assert_eq!(ranked[0].content, "first");
        assert_eq!(ranked[1].content, "second");
    }

    #[test]
    fn test_metadata_serialization_skips_absent_scores() {
        let json = serde_json::to_value(RetrievalMetadata {
            row: 1,
            column_index: 0,
            column: "season".to_string(),
            method: "keyword".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(json.get("bm25_score").is_none());
        assert!(json.get("keywords_matched").is_none());
        assert_eq!(json["column"], "season");
    }
}
