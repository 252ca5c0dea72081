//! Per-strategy planning instructions and deterministic fallback graphs.

use crate::core::{Strategy, SubTask, SubTaskGraph, TaskType};

const AGGREGATION_TEMPLATE: &str = r#"You are an expert at analysing table questions. Split this aggregation question as follows.

Rules:
1. Identify the numeric column(s) to aggregate.
2. Break the aggregation into simple calculation steps.
3. Each sub-task handles a single numeric column.
4. The final step performs the aggregation.

Example output:
{
  "strategy": "aggregation",
  "subtasks": [
    {"id": "task_1", "description": "Extract every value of [column]", "task_type": "independent", "dependencies": [], "expected_output": "list of values", "reasoning_steps": ["locate column", "extract values", "check data"]},
    {"id": "task_2", "description": "Compute the [aggregation]", "task_type": "aggregate", "dependencies": ["task_1"], "expected_output": "aggregated value", "reasoning_steps": ["take values", "aggregate", "return result"]}
  ]
}

Example question: What is the average number of tropical cyclones per season?
Split: 1. extract the tropical cyclones values; 2. average them."#;

const COMPARISON_TEMPLATE: &str = r#"You are an expert at analysing table questions. Split this comparison question as follows.

Rules:
1. Identify the two or more entities being compared.
2. Create one independent sub-task per entity.
3. The final step performs the comparison.
4. The comparison depends on every per-entity sub-task.

Example output:
{
  "strategy": "comparison",
  "subtasks": [
    {"id": "task_1", "description": "Compute [metric] for [entity A]", "task_type": "independent", "dependencies": [], "expected_output": "metric for A", "reasoning_steps": ["locate A", "compute metric", "return result"]},
    {"id": "task_2", "description": "Compute [metric] for [entity B]", "task_type": "independent", "dependencies": [], "expected_output": "metric for B", "reasoning_steps": ["locate B", "compute metric", "return result"]},
    {"id": "task_3", "description": "Compare [metric] of A and B", "task_type": "compare", "dependencies": ["task_1", "task_2"], "expected_output": "comparison result", "reasoning_steps": ["take both values", "compare", "return result"]}
  ]
}

Example question: Which country has higher GDP, China or USA?
Split: 1. GDP of China; 2. GDP of USA; 3. compare the two."#;

const BRIDGE_TEMPLATE: &str = r#"You are an expert at analysing table questions. Split this bridge question as follows.

Rules:
1. Identify the intermediate steps and how they depend on each other.
2. Create sub-tasks in dependency order.
3. Each sub-task's output is the next sub-task's input.
4. Keep the dependency chain complete.

Example output:
{
  "strategy": "bridge",
  "subtasks": [
    {"id": "task_1", "description": "[first step]", "task_type": "bridge", "dependencies": [], "expected_output": "first step result", "reasoning_steps": ["run first step", "return result"]},
    {"id": "task_2", "description": "[second step, uses task_1]", "task_type": "bridge", "dependencies": ["task_1"], "expected_output": "second step result", "reasoning_steps": ["take task_1 result", "run second step", "return result"]}
  ]
}

Example question: What is the total revenue of companies with profit > 1000?
Split: 1. filter companies with profit above 1000; 2. total their revenue."#;

const SEQUENTIAL_TEMPLATE: &str = r#"You are an expert at analysing table questions. Split this sequential question as follows.

Rules:
1. Identify the time series or logical order in the question.
2. Create sub-tasks in that order.
3. Each sub-task may use the previous one's result.
4. Keep the sequence complete.

Example output:
{
  "strategy": "sequential",
  "subtasks": [
    {"id": "task_1", "description": "[first step]", "task_type": "sequential", "dependencies": [], "expected_output": "first step result", "reasoning_steps": ["run first step", "return result"]},
    {"id": "task_2", "description": "[second step]", "task_type": "sequential", "dependencies": ["task_1"], "expected_output": "second step result", "reasoning_steps": ["take task_1 result", "run second step", "return result"]}
  ]
}

Example question: What was the trend of sales from 2020 to 2023?
Split: 1-4. sales for each year from 2020 to 2023; 5. describe the trend."#;

const INDEPENDENT_TEMPLATE: &str = r#"You are an expert at analysing table questions. Split this question into independent parts as follows.

Rules:
1. Identify sub-tasks that can run in parallel.
2. No sub-task depends on another, except the final summary.
3. The final step collects every independent result.
4. Maximise parallelism.

Example output:
{
  "strategy": "independent",
  "subtasks": [
    {"id": "task_1", "description": "[independent task 1]", "task_type": "independent", "dependencies": [], "expected_output": "task 1 result", "reasoning_steps": ["run task 1", "return result"]},
    {"id": "task_2", "description": "[independent task 2]", "task_type": "independent", "dependencies": [], "expected_output": "task 2 result", "reasoning_steps": ["run task 2", "return result"]},
    {"id": "task_3", "description": "Summarise every independent result", "task_type": "aggregate", "dependencies": ["task_1", "task_2"], "expected_output": "summary", "reasoning_steps": ["take all results", "summarise", "return final result"]}
  ]
}

Example question: What are the top 3 countries by population and GDP?
Split: 1. top 3 by population; 2. top 3 by GDP; 3. combine both lists."#;

const OUTPUT_INSTRUCTION: &str = r#"Split the question according to the rules above. Reply with JSON only, in exactly this shape, and nothing else:

```json
{
  "strategy": "strategy name",
  "subtasks": [
    {
      "id": "task_1",
      "description": "task description",
      "task_type": "task type",
      "dependencies": [],
      "expected_output": "expected output",
      "reasoning_steps": ["step 1", "step 2"]
    }
  ]
}
```"#;

/// Returns the planning instructions for a strategy.
#[must_use]
pub fn strategy_template(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Aggregation => AGGREGATION_TEMPLATE,
        Strategy::Comparison => COMPARISON_TEMPLATE,
        Strategy::Bridge => BRIDGE_TEMPLATE,
        Strategy::Sequential => SEQUENTIAL_TEMPLATE,
        Strategy::Independent => INDEPENDENT_TEMPLATE,
    }
}

/// Builds the full planner prompt.
///
/// `context` is the already-rendered context block, empty on the first round.
#[must_use]
pub fn planner_prompt(table_summary: &str, question: &str, context: &str, strategy: Strategy) -> String {
    format!(
        "\n{table_summary}\n\nQuestion: {question}{context}\n\n{}\n\n{OUTPUT_INSTRUCTION}\n",
        strategy_template(strategy)
    )
}

/// The graph used when the planner's response cannot be parsed.
///
/// Every fallback graph is a small chain or fan-in that passes the
/// independence check with no issues.
#[must_use]
pub fn fallback_graph(strategy: Strategy) -> SubTaskGraph {
    let subtasks = match strategy {
        Strategy::Aggregation => vec![
            SubTask::new("task_1", "Extract the relevant data column", TaskType::Independent)
                .with_expected_output("column values")
                .with_reasoning_steps(["analyse the question", "identify the relevant column", "extract the data"]),
            SubTask::new("task_2", "Perform the aggregation", TaskType::Aggregate)
                .with_dependencies(["task_1"])
                .with_expected_output("aggregated value")
                .with_reasoning_steps(["take the data", "compute", "return the result"]),
        ],
        Strategy::Comparison => vec![
            SubTask::new("task_1", "Extract the first entity's data", TaskType::Independent)
                .with_expected_output("value for the first entity")
                .with_reasoning_steps(["identify entity 1", "extract the data", "return the result"]),
            SubTask::new("task_2", "Extract the second entity's data", TaskType::Independent)
                .with_expected_output("value for the second entity")
                .with_reasoning_steps(["identify entity 2", "extract the data", "return the result"]),
            SubTask::new("task_3", "Compare the two entities' values", TaskType::Compare)
                .with_dependencies(["task_1", "task_2"])
                .with_expected_output("comparison result")
                .with_reasoning_steps(["take both values", "compare", "return the result"]),
        ],
        Strategy::Bridge => vec![
            SubTask::new("task_1", "Apply the filter condition", TaskType::Independent)
                .with_expected_output("filtered rows")
                .with_reasoning_steps(["identify the condition", "apply the filter", "return the result"]),
            SubTask::new("task_2", "Compute over the filtered rows", TaskType::Bridge)
                .with_dependencies(["task_1"])
                .with_expected_output("computed value")
                .with_reasoning_steps(["take the filtered rows", "compute", "return the result"]),
        ],
        Strategy::Sequential => vec![
            SubTask::new("task_1", "Extract the time series data", TaskType::Independent)
                .with_expected_output("time series values")
                .with_reasoning_steps(["identify the time column", "extract the data", "sort"]),
            SubTask::new("task_2", "Analyse how the values change", TaskType::Sequential)
                .with_dependencies(["task_1"])
                .with_expected_output("trend analysis")
                .with_reasoning_steps(["take the data", "analyse the trend", "return the result"]),
        ],
        Strategy::Independent => vec![SubTask::new(
            "task_1",
            "Extract all relevant data",
            TaskType::Independent,
        )
        .with_expected_output("list of values")
        .with_reasoning_steps(["analyse the request", "extract the data", "return the result"])],
    };

    SubTaskGraph::new(strategy.as_str(), subtasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(graph: &SubTaskGraph) -> Vec<(&str, TaskType, Vec<&str>)> {
        graph
            .subtasks
            .iter()
            .map(|t| {
                (
                    t.id.as_str(),
                    t.task_type,
                    t.dependencies.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_fallback_shapes() {
        assert_eq!(
            shape(&fallback_graph(Strategy::Aggregation)),
            vec![
                ("task_1", TaskType::Independent, vec![]),
                ("task_2", TaskType::Aggregate, vec!["task_1"]),
            ]
        );
        assert_eq!(
            shape(&fallback_graph(Strategy::Comparison)),
            vec![
                ("task_1", TaskType::Independent, vec![]),
                ("task_2", TaskType::Independent, vec![]),
                ("task_3", TaskType::Compare, vec!["task_1", "task_2"]),
            ]
        );
        assert_eq!(
            shape(&fallback_graph(Strategy::Bridge)),
            vec![
                ("task_1", TaskType::Independent, vec![]),
                ("task_2", TaskType::Bridge, vec!["task_1"]),
            ]
        );
        assert_eq!(
            shape(&fallback_graph(Strategy::Sequential)),
            vec![
                ("task_1", TaskType::Independent, vec![]),
                ("task_2", TaskType::Sequential, vec!["task_1"]),
            ]
        );
        assert_eq!(
            shape(&fallback_graph(Strategy::Independent)),
            vec![("task_1", TaskType::Independent, vec![])]
        );
    }

    #[test]
    fn test_fallback_strategy_name() {
        for strategy in Strategy::PRIORITY {
            assert_eq!(fallback_graph(strategy).strategy, strategy.as_str());
        }
    }

    #[test]
    fn test_planner_prompt_contents() {
        let prompt = planner_prompt("a | b", "Which is bigger?", "\nContext:\n- task_1: 3\n", Strategy::Comparison);
        assert!(prompt.contains("a | b"));
        assert!(prompt.contains("Question: Which is bigger?\nContext:\n- task_1: 3\n"));
        assert!(prompt.contains("comparison question"));
        assert!(prompt.contains("Reply with JSON only"));
    }
}
