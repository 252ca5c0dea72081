//! Sub-task graph types produced by the planner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of work a sub-task performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TaskType {
    /// Stand-alone lookup or extraction (A + B). Assumed when a plan omits
    /// the type.
    #[default]
    Independent,
    /// Uses the output of an earlier step as its input (A -> B -> C).
    Bridge,
    /// Compares the outputs of two or more steps (A vs B).
    Compare,
    /// Combines several values into one (A + B + C).
    Aggregate,
    /// One step of an ordered sequence (A -> B).
    Sequential,
}

impl TaskType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Bridge => "bridge",
            Self::Compare => "compare",
            Self::Aggregate => "aggregate",
            Self::Sequential => "sequential",
        }
    }

    /// Whether the executor gathers retrieval snippets for this kind.
    #[must_use]
    pub fn uses_retrieval(&self) -> bool {
        matches!(self, Self::Independent | Self::Bridge)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "bridge" => Ok(Self::Bridge),
            "compare" => Ok(Self::Compare),
            "aggregate" => Ok(Self::Aggregate),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown task type '{other}'")),
        }
    }
}

impl TryFrom<String> for TaskType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A decomposition pattern chosen for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Extract values, then combine them.
    Aggregation,
    /// Compute per-entity values, then compare.
    Comparison,
    /// Filter first, then compute over the filtered rows.
    Bridge,
    /// Walk an ordered or time-based sequence.
    Sequential,
    /// Parallel lookups with no shared inputs.
    Independent,
}

impl Strategy {
    /// All strategies in tie-break priority order.
    pub const PRIORITY: [Self; 5] = [
        Self::Aggregation,
        Self::Comparison,
        Self::Bridge,
        Self::Sequential,
        Self::Independent,
    ];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregation => "aggregation",
            Self::Comparison => "comparison",
            Self::Bridge => "bridge",
            Self::Sequential => "sequential",
            Self::Independent => "independent",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Aggregation
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of question-answering work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    /// Identifier, unique within its graph.
    pub id: String,
    /// What the sub-task should do.
    pub description: String,
    /// The kind of work.
    #[serde(default)]
    pub task_type: TaskType,
    /// Ids of sub-tasks whose results must be in the context first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// What the result should look like.
    #[serde(default)]
    pub expected_output: String,
    /// Ordered hints for carrying out the work.
    #[serde(default)]
    pub reasoning_steps: Vec<String>,
}

impl SubTask {
    /// Creates a sub-task with no dependencies.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            task_type,
            dependencies: Vec::new(),
            expected_output: String::new(),
            reasoning_steps: Vec::new(),
        }
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the expected output description.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    /// Sets the reasoning steps.
    #[must_use]
    pub fn with_reasoning_steps(mut self, steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.reasoning_steps = steps.into_iter().map(Into::into).collect();
        self
    }
}

/// The graph of sub-tasks produced for one planning round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskGraph {
    /// Strategy name as reported by the planner.
    #[serde(default)]
    pub strategy: String,
    /// Sub-tasks in listed order.
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
}

impl SubTaskGraph {
    /// Creates a graph for a strategy.
    #[must_use]
    pub fn new(strategy: impl Into<String>, subtasks: Vec<SubTask>) -> Self {
        Self {
            strategy: strategy.into(),
            subtasks,
        }
    }

    /// Returns the number of sub-tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subtasks.len()
    }

    /// Returns true if the graph holds no sub-tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    /// Looks up a sub-task by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SubTask> {
        self.subtasks.iter().find(|t| t.id == id)
    }
}
