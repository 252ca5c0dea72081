//! Tests for hybrid retrieval and score fusion.

#[cfg(test)]
mod tests {
    use crate::cancellation::CallScope;
    use crate::core::Table;
    use crate::retrieval::{
        bm25_score, cosine_similarity, fuse, overlap_score, FusionWeights, HybridRetrieval,
        RetrievalMetadata, RetrievalMethod, RetrievalResult,
    };
    use crate::testing::{FailingEmbedder, KeywordEmbedder};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn cell(row: usize, column_index: usize, content: &str, score: f64) -> RetrievalResult {
        RetrievalResult::new(
            content,
            score,
            format!("row_{row}_col_{column_index}"),
            RetrievalMetadata {
                row,
                column_index,
                column: format!("col_{column_index}"),
                method: "test".to_string(),
                ..Default::default()
            },
        )
    }

    fn storms() -> Table {
        Table::from_rows(
            &["season", "event"],
            &[
                &["1990-91", "tropical storm"],
                &["1991-92", "cyclone season"],
                &["1992-93", "quiet year"],
            ],
        )
    }

    #[test]
    fn test_bm25_score_term_frequency() {
        assert!((bm25_score("cyclone", "cyclone season") - 0.5).abs() < 1e-12);
        assert!((bm25_score("Cyclone SEASON", "cyclone season") - 1.0).abs() < 1e-12);
        assert!((bm25_score("storm storm", "storm") - 2.0).abs() < 1e-12);
        assert_eq!(bm25_score("cyclone", ""), 0.0);
        assert_eq!(bm25_score("", "cyclone"), 0.0);
    }

    #[test]
    fn test_overlap_score_uses_distinct_words() {
        assert!((overlap_score("a b b", "b c") - 0.5).abs() < 1e-12);
        assert_eq!(overlap_score("", "b"), 0.0);
        assert_eq!(overlap_score("a", ""), 0.0);
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_fuse_takes_union_with_missing_side_zero() {
        let lexical = vec![cell(0, 1, "tropical storm", 0.5)];
        let dense = vec![cell(0, 1, "tropical storm", 1.0), cell(2, 0, "1992-93", 0.4)];

        let fused = fuse(&lexical, &dense, FusionWeights::default(), 10);

        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].source, "combined_0_1");
        assert!((fused[0].score - (0.3 * 0.5 + 0.7 * 1.0)).abs() < 1e-12);
        assert_eq!(fused[0].metadata.bm25_score, Some(0.5));
        assert_eq!(fused[0].metadata.dense_score, Some(1.0));

        assert_eq!(fused[1].source, "combined_2_0");
        assert!((fused[1].score - 0.7 * 0.4).abs() < 1e-12);
        assert_eq!(fused[1].metadata.bm25_score, Some(0.0));
    }

    #[test]
    fn test_fuse_respects_top_k() {
        let lexical: Vec<_> = (0..5).map(|i| cell(i, 0, "x", 0.1 * i as f64)).collect();
        let fused = fuse(&lexical, &[], FusionWeights::default(), 3);

        assert_eq!(fused.len(), 3);
        assert_eq!(fused[0].metadata.row, 4);
    }

    #[tokio::test]
    async fn test_search_without_embedder_uses_overlap() {
        let method = HybridRetrieval::new();
        let results = method
            .search("cyclone season", &storms(), 3, &CallScope::new())
            .await
            .unwrap();

        assert_eq!(results[0].content, "cyclone season");
        assert_eq!(results[0].source, "combined_1_1");
        // bm25 = 1.0, overlap = 1.0
        assert!((results[0].score - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_search_with_embedder() {
        let method = HybridRetrieval::new().with_embedder(Arc::new(KeywordEmbedder::new(&["storm"])));
        let results = method
            .search("storm", &storms(), 3, &CallScope::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "tropical storm");
        assert!((results[0].score - (0.3 * 0.5 + 0.7 * 1.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_overlap() {
        let with_broken = HybridRetrieval::new().with_embedder(Arc::new(FailingEmbedder));
        let plain = HybridRetrieval::new();
        let scope = CallScope::new();

        let a = with_broken.search("quiet year", &storms(), 3, &scope).await.unwrap();
        let b = plain.search("quiet year", &storms(), 3, &scope).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0].content, "quiet year");
    }

    #[tokio::test]
    async fn test_cancelled_scope_falls_back_to_overlap() {
        let method = HybridRetrieval::new().with_embedder(Arc::new(KeywordEmbedder::new(&["storm"])));
        let scope = CallScope::new();
        scope.cancel("stop");

        let results = method.search("quiet year", &storms(), 3, &scope).await.unwrap();
        assert_eq!(results[0].content, "quiet year");
    }

    proptest! {
        #[test]
        fn prop_combined_non_decreasing_in_each_input(
            bm25 in 0.0f64..10.0,
            dense in 0.0f64..1.0,
            delta in 0.0f64..5.0,
        ) {
            let weights = FusionWeights::new(0.3, 0.7);
            let base = weights.combine(bm25, dense);
            prop_assert!(weights.combine(bm25 + delta, dense) >= base);
            prop_assert!(weights.combine(bm25, dense + delta) >= base);
        }
    }
}
