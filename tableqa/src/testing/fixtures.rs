//! Tables and canned planner responses for tests.

use crate::core::{SubTask, SubTaskGraph, Table};

/// The cyclone-season table used across the crate's tests.
#[must_use]
pub fn cyclones_table() -> Table {
    Table::from_rows(
        &["season", "cyclones"],
        &[&["1990-91", "10"], &["1991-92", "10"], &["1992-93", "3"]],
    )
}

/// A small league table with text and numeric columns.
#[must_use]
pub fn league_table() -> Table {
    Table::from_rows(
        &["team", "city", "wins", "losses"],
        &[
            &["Rovers", "Leeds", "12", "4"],
            &["United", "Leeds", "7", "9"],
            &["Athletic", "York", "10", "6"],
        ],
    )
}

/// A table with `rows` numbered rows, for truncation and benchmark tests.
#[must_use]
pub fn numbered_table(rows: usize) -> Table {
    Table::new(
        vec!["id".to_string(), "label".to_string(), "value".to_string()],
        (0..rows)
            .map(|i| vec![i.to_string(), format!("item {i}"), (i * 7 % 100).to_string()])
            .collect(),
    )
}

/// Serializes a graph as a planner would return it, inside a json fence.
#[must_use]
pub fn plan_response(strategy: &str, subtasks: Vec<SubTask>) -> String {
    let graph = SubTaskGraph::new(strategy, subtasks);
    let json = serde_json::to_string_pretty(&graph).unwrap_or_default();
    format!("```json\n{json}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaskType;
    use crate::planning::parse_plan;

    #[test]
    fn test_plan_response_parses_back() {
        let response = plan_response(
            "bridge",
            vec![SubTask::new("task_1", "filter", TaskType::Bridge)],
        );
        let graph = parse_plan(&response).unwrap();
        assert_eq!(graph.subtasks[0].id, "task_1");
    }

    #[test]
    fn test_numbered_table() {
        let table = numbered_table(12);
        assert_eq!(table.row_count(), 12);
        assert_eq!(table.rows[11][1], "item 11");
    }
}
