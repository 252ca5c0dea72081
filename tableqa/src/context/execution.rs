//! The per-question map from completed sub-task id to result text.

use serde::Serialize;
use std::collections::HashMap;

/// Accumulated results of completed sub-tasks.
///
/// Entries are never removed. Writing an id that is already present
/// replaces its text but keeps its original position, so rendering order
/// is first-completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result for a sub-task id.
    ///
    /// Returns true if the id was not present before.
    pub fn insert(&mut self, id: impl Into<String>, result: impl Into<String>) -> bool {
        let id = id.into();
        let result = result.into();

        if let Some(&pos) = self.index.get(&id) {
            self.entries[pos].1 = result;
            return false;
        }

        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, result));
        true
    }

    /// Gets the result for an id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.index.get(id).map(|&pos| self.entries[pos].1.as_str())
    }

    /// Checks if an id has a result.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Whether every dependency is already present.
    #[must_use]
    pub fn satisfies<S: AsRef<str>>(&self, dependencies: &[S]) -> bool {
        dependencies.iter().all(|dep| self.contains(dep.as_ref()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders entries as `- id: result` lines under a heading.
    ///
    /// Returns an empty string when there are no entries.
    #[must_use]
    pub fn render(&self, heading: &str) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut out = format!("\n{heading}:\n");
        for (key, value) in &self.entries {
            out.push_str(&format!("- {key}: {value}\n"));
        }
        out
    }

    /// Returns a copy of the entries in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.insert("task_1", "10, 10, 3"));
        assert_eq!(ctx.get("task_1"), Some("10, 10, 3"));
        assert!(ctx.contains("task_1"));
        assert!(!ctx.contains("task_2"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("task_1", "a");
        ctx.insert("task_2", "b");
        assert!(!ctx.insert("task_1", "c"));

        let entries: Vec<_> = ctx.iter().collect();
        assert_eq!(entries, vec![("task_1", "c"), ("task_2", "b")]);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_satisfies() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("task_1", "x");

        assert!(ctx.satisfies::<&str>(&[]));
        assert!(ctx.satisfies(&["task_1"]));
        assert!(!ctx.satisfies(&["task_1", "task_2"]));
    }

    #[test]
    fn test_render() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(ctx.render("Context"), "");

        ctx.insert("task_1", "7.67");
        assert_eq!(ctx.render("Context"), "\nContext:\n- task_1: 7.67\n");
    }
}
