//! Scoring table cells against a query.
//!
//! Two methods are provided: keyword matching and a hybrid of BM25-like
//! lexical scoring with dense similarity. Methods are registered by name in
//! a [`RetrievalRegistry`].

mod config;
mod hybrid;
mod hybrid_tests;
mod keyword;
mod registry;
mod result;

pub use config::{FusionWeights, RetrievalOptions};
pub use hybrid::{bm25_score, cosine_similarity, fuse, overlap_score, HybridRetrieval, HYBRID_METHOD};
pub use keyword::{extract_keywords, keyword_score, KeywordRetrieval, KEYWORD_METHOD};
pub use registry::RetrievalRegistry;
pub use result::{RetrievalMetadata, RetrievalResult};

use crate::cancellation::CallScope;
use crate::core::Table;
use crate::errors::RetrievalError;
use async_trait::async_trait;

/// A way of scoring table cells against a query.
#[async_trait]
pub trait RetrievalMethod: Send + Sync {
    /// Returns the registry name.
    fn name(&self) -> &str;

    /// Returns at most `top_k` cells by descending score.
    ///
    /// # Errors
    ///
    /// Returns a `RetrievalError` if the method cannot score the table.
    async fn search(
        &self,
        query: &str,
        table: &Table,
        top_k: usize,
        scope: &CallScope,
    ) -> Result<Vec<RetrievalResult>, RetrievalError>;
}
