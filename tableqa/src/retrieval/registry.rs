//! Name-keyed registry of retrieval methods.

use super::{HybridRetrieval, KeywordRetrieval, RetrievalMethod, RetrievalResult};
use crate::cancellation::CallScope;
use crate::core::Table;
use crate::errors::RetrievalError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Retrieval methods keyed by name, kept in registration order.
#[derive(Default, Clone)]
pub struct RetrievalRegistry {
    methods: HashMap<String, Arc<dyn RetrievalMethod>>,
    order: Vec<String>,
}

impl std::fmt::Debug for RetrievalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalRegistry")
            .field("methods", &self.order)
            .finish()
    }
}

impl RetrievalRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the keyword method and the given hybrid
    /// method, in that order.
    #[must_use]
    pub fn standard(hybrid: HybridRetrieval) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(KeywordRetrieval::new()));
        registry.register(Arc::new(hybrid));
        registry
    }

    /// Registers a method under its own name.
    ///
    /// Re-registering a name replaces the method but keeps its position.
    pub fn register(&mut self, method: Arc<dyn RetrievalMethod>) {
        let name = method.name().to_string();
        if !self.methods.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.methods.insert(name, method);
    }

    /// Gets a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RetrievalMethod>> {
        self.methods.get(name)
    }

    /// Lists method names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Runs one named method.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMethod` if nothing is registered under `name`, or the
    /// method's own error.
    pub async fn search(
        &self,
        name: &str,
        query: &str,
        table: &Table,
        top_k: usize,
        scope: &CallScope,
    ) -> Result<Vec<RetrievalResult>, RetrievalError> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| RetrievalError::unknown_method(name))?;
        method.search(query, table, top_k, scope).await
    }

    /// Runs every registered method in order.
    ///
    /// A failing method is logged and contributes an empty list; the others
    /// still run.
    pub async fn multi_search(
        &self,
        query: &str,
        table: &Table,
        top_k: usize,
        scope: &CallScope,
    ) -> Vec<(String, Vec<RetrievalResult>)> {
        let mut all = Vec::with_capacity(self.order.len());

        for name in &self.order {
            let Some(method) = self.methods.get(name) else {
                continue;
            };

            let results = match method.search(query, table, top_k, scope).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(method = %name, error = %e, "Retrieval method failed");
                    Vec::new()
                }
            };
            all.push((name.clone(), results));
        }

        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingMethod;

    #[async_trait]
    impl RetrievalMethod for FailingMethod {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(
            &self,
            _query: &str,
            _table: &Table,
            _top_k: usize,
            _scope: &CallScope,
        ) -> Result<Vec<RetrievalResult>, RetrievalError> {
            Err(RetrievalError::method_failed("failing", "index corrupt"))
        }
    }

    fn table() -> Table {
        Table::from_rows(&["team", "wins"], &[&["Rovers", "12"], &["United", "7"]])
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = RetrievalRegistry::standard(HybridRetrieval::new());
        assert_eq!(registry.names(), &["keyword".to_string(), "hybrid".to_string()]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_search_unknown_method() {
        let registry = RetrievalRegistry::standard(HybridRetrieval::new());
        let err = registry
            .search("vector", "rovers", &table(), 3, &CallScope::new())
            .await
            .unwrap_err();

        assert_eq!(err, RetrievalError::unknown_method("vector"));
    }

    #[tokio::test]
    async fn test_search_named_method() {
        let registry = RetrievalRegistry::standard(HybridRetrieval::new());
        let results = registry
            .search("keyword", "rovers", &table(), 3, &CallScope::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "row_0_col_0");
    }

    #[tokio::test]
    async fn test_multi_search_isolates_failures() {
        let mut registry = RetrievalRegistry::new();
        registry.register(Arc::new(FailingMethod));
        registry.register(Arc::new(KeywordRetrieval::new()));

        let all = registry
            .multi_search("rovers", &table(), 3, &CallScope::new())
            .await;

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "failing");
        assert!(all[0].1.is_empty());
        assert_eq!(all[1].0, "keyword");
        assert_eq!(all[1].1.len(), 1);
    }

    #[test]
    fn test_reregister_keeps_position() {
        let mut registry = RetrievalRegistry::standard(HybridRetrieval::new());
        registry.register(Arc::new(KeywordRetrieval::new()));
        assert_eq!(registry.names()[0], "keyword");
        assert_eq!(registry.len(), 2);
    }
}
