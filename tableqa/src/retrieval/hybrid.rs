//! Lexical plus dense retrieval with weighted score fusion.

use super::config::{FusionWeights, RetrievalOptions};
use super::result::{rank, RetrievalMetadata, RetrievalResult};
use super::RetrievalMethod;
use crate::cancellation::CallScope;
use crate::core::Table;
use crate::errors::RetrievalError;
use crate::services::EmbeddingService;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Registry name of the hybrid method.
pub const HYBRID_METHOD: &str = "hybrid";

/// Simplified BM25: the sum over query terms of the term's frequency in the
/// document divided by the document length in tokens.
///
/// Both sides are lower-cased and split on whitespace.
#[must_use]
pub fn bm25_score(query: &str, document: &str) -> f64 {
    let query = query.to_lowercase();
    let document = document.to_lowercase();
    let doc_terms: Vec<&str> = document.split_whitespace().collect();
    if doc_terms.is_empty() {
        return 0.0;
    }

    let doc_len = doc_terms.len() as f64;
    query
        .split_whitespace()
        .map(|term| doc_terms.iter().filter(|t| **t == term).count())
        .filter(|&tf| tf > 0)
        .map(|tf| tf as f64 / doc_len)
        .sum()
}

/// Share of distinct query words that also appear in the text.
///
/// Inputs are compared as given; callers lower-case them first.
#[must_use]
pub fn overlap_score(query: &str, text: &str) -> f64 {
    let query_words: HashSet<&str> = query.split_whitespace().collect();
    let text_words: HashSet<&str> = text.split_whitespace().collect();
    if query_words.is_empty() || text_words.is_empty() {
        return 0.0;
    }

    let overlap = query_words.intersection(&text_words).count();
    overlap as f64 / query_words.len() as f64
}

/// Cosine similarity; zero for empty, mismatched, or zero-norm vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Fuses two scored lists keyed by cell position.
///
/// Every cell that appears on either side is kept; a missing side counts as
/// zero. Cells are emitted lexical-first in first-seen order, then ranked.
#[must_use]
pub fn fuse(
    lexical: &[RetrievalResult],
    dense: &[RetrievalResult],
    weights: FusionWeights,
    top_k: usize,
) -> Vec<RetrievalResult> {
    struct Entry<'a> {
        origin: &'a RetrievalResult,
        bm25: f64,
        dense: f64,
    }

    let mut order: Vec<Entry<'_>> = Vec::new();
    let mut index: HashMap<(usize, usize), usize> = HashMap::new();

    for result in lexical {
        let key = (result.metadata.row, result.metadata.column_index);
        index.insert(key, order.len());
        order.push(Entry {
            origin: result,
            bm25: result.score,
            dense: 0.0,
        });
    }

    for result in dense {
        let key = (result.metadata.row, result.metadata.column_index);
        if let Some(&pos) = index.get(&key) {
            order[pos].dense = result.score;
        } else {
            index.insert(key, order.len());
            order.push(Entry {
                origin: result,
                bm25: 0.0,
                dense: result.score,
            });
        }
    }

    let fused = order
        .into_iter()
        .map(|entry| {
            let combined = weights.combine(entry.bm25, entry.dense);
            let meta = &entry.origin.metadata;
            RetrievalResult::new(
                entry.origin.content.clone(),
                combined,
                format!("combined_{}_{}", meta.row, meta.column_index),
                RetrievalMetadata {
                    row: meta.row,
                    column_index: meta.column_index,
                    column: meta.column.clone(),
                    method: HYBRID_METHOD.to_string(),
                    keywords_matched: Vec::new(),
                    bm25_score: Some(entry.bm25),
                    dense_score: Some(entry.dense),
                    combined_score: Some(combined),
                },
            )
        })
        .collect();

    rank(fused, top_k)
}

/// BM25-like lexical scoring fused with embedding similarity.
///
/// Without an embedder, or when embedding fails, the dense side falls back
/// to whitespace token overlap with its own acceptance threshold.
#[derive(Clone)]
pub struct HybridRetrieval {
    embedder: Option<Arc<dyn EmbeddingService>>,
    options: RetrievalOptions,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for HybridRetrieval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetrieval")
            .field("has_embedder", &self.embedder.is_some())
            .field("options", &self.options)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl Default for HybridRetrieval {
    fn default() -> Self {
        Self::new()
    }
}

impl HybridRetrieval {
    /// Creates the method without an embedder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            embedder: None,
            options: RetrievalOptions::default(),
            call_timeout: None,
        }
    }

    /// Uses an embedding service for the dense side.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingService>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Sets scoring options.
    #[must_use]
    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    /// Bounds each embedding call.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Returns the scoring options.
    #[must_use]
    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    /// Every cell with a positive lexical score, in table order.
    #[must_use]
    pub fn lexical_side(&self, query: &str, table: &Table) -> Vec<RetrievalResult> {
        table
            .cells()
            .filter_map(|(i, j, cell)| {
                let score = bm25_score(query, cell);
                (score > 0.0).then(|| {
                    RetrievalResult::new(
                        cell,
                        score,
                        format!("bm25_row_{i}_col_{j}"),
                        cell_metadata(table, i, j, "bm25"),
                    )
                })
            })
            .collect()
    }

    /// Every cell whose token overlap with the query passes the threshold.
    #[must_use]
    pub fn overlap_side(&self, query: &str, table: &Table) -> Vec<RetrievalResult> {
        let query = query.to_lowercase();
        table
            .cells()
            .filter_map(|(i, j, cell)| {
                let score = overlap_score(&query, &cell.to_lowercase());
                (score > self.options.overlap_threshold).then(|| {
                    RetrievalResult::new(
                        cell,
                        score,
                        format!("overlap_row_{i}_col_{j}"),
                        cell_metadata(table, i, j, "overlap"),
                    )
                })
            })
            .collect()
    }

    async fn embedding_side(
        &self,
        embedder: &dyn EmbeddingService,
        query: &str,
        table: &Table,
        scope: &CallScope,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let query_vec = scope.guard(self.call_timeout, embedder.encode(query)).await??;

        let mut results = Vec::new();
        for (i, j, cell) in table.cells() {
            let cell_vec = scope.guard(self.call_timeout, embedder.encode(cell)).await??;
            let similarity = cosine_similarity(&query_vec, &cell_vec);
            if similarity > self.options.embedding_threshold {
                results.push(RetrievalResult::new(
                    cell,
                    similarity,
                    format!("dense_row_{i}_col_{j}"),
                    cell_metadata(table, i, j, "dense"),
                ));
            }
        }
        Ok(results)
    }

    async fn dense_side(&self, query: &str, table: &Table, scope: &CallScope) -> Vec<RetrievalResult> {
        let Some(embedder) = self.embedder.as_deref() else {
            return self.overlap_side(query, table);
        };

        match self.embedding_side(embedder, query, table, scope).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Embedding failed, falling back to token overlap");
                self.overlap_side(query, table)
            }
        }
    }
}

#[async_trait]
impl RetrievalMethod for HybridRetrieval {
    fn name(&self) -> &str {
        HYBRID_METHOD
    }

    async fn search(
        &self,
        query: &str,
        table: &Table,
        top_k: usize,
        scope: &CallScope,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let lexical = self.lexical_side(query, table);
        let dense = self.dense_side(query, table, scope).await;
        debug!(
            lexical = lexical.len(),
            dense = dense.len(),
            "Fusing hybrid retrieval candidates"
        );
        Ok(fuse(&lexical, &dense, self.options.weights(), top_k))
    }
}

fn cell_metadata(table: &Table, row: usize, column_index: usize, method: &str) -> RetrievalMetadata {
    RetrievalMetadata {
        row,
        column_index,
        column: table.column_name(column_index),
        method: method.to_string(),
        ..Default::default()
    }
}
