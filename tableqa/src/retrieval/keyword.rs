//! Sparse keyword matching over table cells.

use super::result::{rank, RetrievalMetadata, RetrievalResult};
use super::RetrievalMethod;
use crate::cancellation::CallScope;
use crate::core::Table;
use crate::errors::RetrievalError;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Registry name of the keyword method.
pub const KEYWORD_METHOD: &str = "keyword";

#[allow(clippy::expect_used)]
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should",
];

/// Extracts lower-cased query keywords.
///
/// Stop words and tokens of two characters or fewer are dropped. Repeated
/// words are kept, so they weigh more in the score.
#[must_use]
pub fn extract_keywords(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Fraction of keywords that occur as substrings of `text`.
///
/// `text` is expected to be lower-cased already.
#[must_use]
pub fn keyword_score(keywords: &[String], text: &str) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let matches = keywords.iter().filter(|kw| text.contains(kw.as_str())).count();
    matches as f64 / keywords.len() as f64
}

/// Scores each cell by the share of query keywords it contains.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRetrieval;

impl KeywordRetrieval {
    /// Creates the method.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Scores the table synchronously. Keyword matching never fails.
    #[must_use]
    pub fn score_table(&self, query: &str, table: &Table, top_k: usize) -> Vec<RetrievalResult> {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for (i, j, cell) in table.cells() {
            let lowered = cell.to_lowercase();
            let score = keyword_score(&keywords, &lowered);
            if score <= 0.0 {
                continue;
            }

            let matched = keywords
                .iter()
                .filter(|kw| lowered.contains(kw.as_str()))
                .cloned()
                .collect();

            results.push(RetrievalResult::new(
                cell,
                score,
                format!("row_{i}_col_{j}"),
                RetrievalMetadata {
                    row: i,
                    column_index: j,
                    column: table.column_name(j),
                    method: KEYWORD_METHOD.to_string(),
                    keywords_matched: matched,
                    ..Default::default()
                },
            ));
        }

        rank(results, top_k)
    }
}

#[async_trait]
impl RetrievalMethod for KeywordRetrieval {
    fn name(&self) -> &str {
        KEYWORD_METHOD
    }

    async fn search(
        &self,
        query: &str,
        table: &Table,
        top_k: usize,
        _scope: &CallScope,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        Ok(self.score_table(query, table, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn players() -> Table {
        Table::from_rows(
            &["player", "team", "goals"],
            &[
                &["Alice Smith", "Rovers", "12"],
                &["Bob Jones", "United", "7"],
                &["Carol Smith", "Rovers United", "3"],
            ],
        )
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_short_tokens() {
        let keywords = extract_keywords("How many goals did the Rovers score in 2019?");
        assert_eq!(keywords, vec!["how", "many", "goals", "rovers", "score", "2019"]);
    }

    #[test]
    fn test_keyword_score_fraction() {
        let keywords = vec!["rovers".to_string(), "united".to_string()];
        assert!((keyword_score(&keywords, "rovers united") - 1.0).abs() < f64::EPSILON);
        assert!((keyword_score(&keywords, "rovers") - 0.5).abs() < f64::EPSILON);
        assert_eq!(keyword_score(&[], "anything"), 0.0);
    }

    #[test]
    fn test_score_table_ranks_best_cell_first() {
        let results = KeywordRetrieval::new().score_table("Rovers United", &players(), 3);

        assert_eq!(results[0].content, "Rovers United");
        assert_eq!(results[0].source, "row_2_col_1");
        assert_eq!(results[0].metadata.column, "team");
        assert_eq!(results[0].metadata.keywords_matched, vec!["rovers", "united"]);
        assert!(results.iter().all(|r| r.score > 0.0));
        assert!(results.len() <= 3);
    }

    #[test]
    fn test_score_table_no_keywords() {
        let results = KeywordRetrieval::new().score_table("is it on?", &players(), 3);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_through_trait() {
        let method: &dyn RetrievalMethod = &KeywordRetrieval::new();
        let results = method
            .search("smith", &players(), 5, &CallScope::new())
            .await
            .unwrap();

        assert_eq!(method.name(), "keyword");
        assert_eq!(results.len(), 2);
    }
}
