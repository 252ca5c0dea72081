//! Structural checks on the dependency graph of a plan.

use crate::core::SubTaskGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Structural problems found in a sub-task graph.
///
/// None of these fail a round: tasks with unsatisfiable dependencies just
/// never become ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagReport {
    /// Ids that occur more than once.
    pub duplicate_ids: Vec<String>,
    /// Tasks that list themselves as a dependency.
    pub self_dependencies: Vec<String>,
    /// `(task, dependency)` pairs naming ids absent from the graph.
    pub unknown_dependencies: Vec<(String, String)>,
    /// The first cycle found, as a closed path of ids.
    pub cycle: Option<Vec<String>>,
}

impl DagReport {
    /// True if the dependencies form a DAG: no self-reference and no cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.self_dependencies.is_empty() && self.cycle.is_none()
    }

    /// True if nothing at all was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.is_acyclic() && self.duplicate_ids.is_empty() && self.unknown_dependencies.is_empty()
    }

    /// Human-readable descriptions of every problem.
    #[must_use]
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for id in &self.duplicate_ids {
            issues.push(format!("duplicate sub-task id {id}"));
        }
        for id in &self.self_dependencies {
            issues.push(format!("sub-task {id} depends on itself"));
        }
        for (id, dep) in &self.unknown_dependencies {
            issues.push(format!("sub-task {id} depends on unknown sub-task {dep}"));
        }
        if let Some(cycle) = &self.cycle {
            issues.push(format!("dependency cycle: {}", cycle.join(" -> ")));
        }
        issues
    }
}

impl SubTaskGraph {
    /// Checks the dependency structure without modifying the graph.
    #[must_use]
    pub fn check_dag(&self) -> DagReport {
        let mut report = DagReport::default();
        let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for task in &self.subtasks {
            if deps.contains_key(task.id.as_str()) {
                if !report.duplicate_ids.contains(&task.id) {
                    report.duplicate_ids.push(task.id.clone());
                }
                continue;
            }
            order.push(task.id.as_str());
            deps.insert(
                task.id.as_str(),
                task.dependencies.iter().map(String::as_str).collect(),
            );
        }

        for task in &self.subtasks {
            for dep in &task.dependencies {
                if *dep == task.id {
                    if !report.self_dependencies.contains(&task.id) {
                        report.self_dependencies.push(task.id.clone());
                    }
                } else if !deps.contains_key(dep.as_str()) {
                    report
                        .unknown_dependencies
                        .push((task.id.clone(), dep.clone()));
                }
            }
        }

        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        let mut path = Vec::new();
        for id in order {
            if visited.contains(id) {
                continue;
            }
            if let Some(cycle) = find_cycle(id, &deps, &mut visited, &mut on_path, &mut path) {
                report.cycle = Some(cycle);
                break;
            }
        }

        report
    }
}

fn find_cycle<'a>(
    node: &'a str,
    deps: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_path: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    on_path.insert(node);
    path.push(node);

    for &dep in deps.get(node).map(Vec::as_slice).unwrap_or_default() {
        // Self-dependencies are reported separately.
        if dep == node || !deps.contains_key(dep) {
            continue;
        }
        if on_path.contains(dep) {
            let start = path.iter().position(|n| *n == dep).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
            cycle.push(dep.to_string());
            return Some(cycle);
        }
        if !visited.contains(dep) {
            if let Some(cycle) = find_cycle(dep, deps, visited, on_path, path) {
                return Some(cycle);
            }
        }
    }

    path.pop();
    on_path.remove(node);
    None
}
