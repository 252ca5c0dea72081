//! Turning a planner response into a sub-task graph.

use crate::core::SubTaskGraph;
use crate::errors::PlanParseError;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("json fence pattern is valid")
});

#[allow(clippy::expect_used)]
static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```\s*(\{.*?\})\s*```").expect("fence pattern is valid")
});

/// Candidate JSON spans in the order they are tried: the widest brace span,
/// then the first `json` fenced block, then the first fenced block of any
/// kind.
fn candidates(response: &str) -> Vec<&str> {
    let mut spans = Vec::with_capacity(3);

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            spans.push(&response[start..=end]);
        }
    }

    for pattern in [&*JSON_FENCE, &*ANY_FENCE] {
        if let Some(span) = pattern.captures(response).and_then(|c| c.get(1)) {
            spans.push(span.as_str());
        }
    }

    spans
}

/// Parses a planner response into a graph.
///
/// The first candidate span that decodes against the graph schema and
/// holds at least one sub-task wins.
///
/// # Errors
///
/// Returns `NoJson` when the response holds no brace-delimited span,
/// `Empty` when the only decodable graphs have no sub-tasks, and `Schema`
/// otherwise.
pub fn parse_plan(response: &str) -> Result<SubTaskGraph, PlanParseError> {
    let spans = candidates(response);
    if spans.is_empty() {
        return Err(PlanParseError::NoJson);
    }

    let mut last_error = PlanParseError::NoJson;
    for span in spans {
        match serde_json::from_str::<SubTaskGraph>(span) {
            Ok(graph) if !graph.is_empty() => return Ok(graph),
            Ok(_) => last_error = PlanParseError::Empty,
            Err(e) => {
                if last_error != PlanParseError::Empty {
                    last_error = PlanParseError::Schema(e.to_string());
                }
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaskType;

    const GRAPH: &str = r#"{"strategy": "bridge", "subtasks": [
        {"id": "task_1", "description": "filter", "task_type": "Bridge", "dependencies": []},
        {"id": "task_2", "description": "sum", "task_type": "aggregate", "dependencies": ["task_1"]}
    ]}"#;

    #[test]
    fn test_parse_bare_json() {
        let graph = parse_plan(GRAPH).unwrap();
        assert_eq!(graph.strategy, "bridge");
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.subtasks[0].task_type, TaskType::Bridge);
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let response = format!("Here is the plan:\n{GRAPH}\nGood luck!");
        assert_eq!(parse_plan(&response).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_falls_through_to_fenced_block() {
        // The widest brace span covers two objects and is not valid JSON.
        let response = format!("```json\n{GRAPH}\n```\nalso {{not json}}");
        assert_eq!(parse_plan(&response).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_any_fence() {
        let response = format!("```\n{GRAPH}\n``` trailing }}");
        assert_eq!(parse_plan(&response).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_no_json() {
        assert_eq!(parse_plan("I cannot help with that."), Err(PlanParseError::NoJson));
    }

    #[test]
    fn test_parse_empty_graph_is_failure() {
        assert_eq!(
            parse_plan(r#"{"strategy": "aggregation", "subtasks": []}"#),
            Err(PlanParseError::Empty)
        );
    }

    #[test]
    fn test_parse_schema_mismatch() {
        let err = parse_plan(r#"{"subtasks": [{"id": "task_1"}]}"#).unwrap_err();
        assert!(matches!(err, PlanParseError::Schema(_)));
    }

    #[test]
    fn test_missing_task_type_defaults_to_independent() {
        let response = r#"{"strategy": "comparison", "subtasks": [
            {"id": "task_1", "description": "Rovers wins"},
            {"id": "task_2", "description": "United wins"},
            {"id": "task_3", "description": "compare", "task_type": "compare",
             "dependencies": ["task_1", "task_2"]}
        ]}"#;

        let graph = parse_plan(response).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.subtasks[0].task_type, TaskType::Independent);
        assert_eq!(graph.subtasks[1].task_type, TaskType::Independent);
        assert_eq!(graph.subtasks[2].task_type, TaskType::Compare);
    }

    #[test]
    fn test_parse_unknown_task_type_is_schema_error() {
        let err = parse_plan(
            r#"{"subtasks": [{"id": "t", "description": "d", "task_type": "join"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanParseError::Schema(_)));
    }
}
