//! Turning a question into a graph of sub-tasks.
//!
//! The classifier picks a strategy, the planner asks the model for a graph
//! and falls back to a fixed template when the response is unusable, and
//! the validator reports structural problems without blocking anything.

mod classifier;
mod dag;
mod parse;
mod planner;
mod templates;
mod validator;

pub use classifier::{classify, strategy_keywords, strategy_score};
pub use dag::DagReport;
pub use parse::parse_plan;
pub use planner::{PlanOutcome, Planner, CONTEXT_HEADING};
pub use templates::{fallback_graph, planner_prompt, strategy_template};
pub use validator::IndependenceValidator;
