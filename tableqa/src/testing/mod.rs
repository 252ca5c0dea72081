//! Testing utilities for the question-answering pipeline.
//!
//! This module provides:
//! - Scripted generation and embedding collaborators
//! - Table fixtures and canned planner responses
//! - Assertions over pipeline results

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_answer_format, assert_dependencies_respected, assert_terminal_state};
pub use fixtures::{cyclones_table, league_table, numbered_table, plan_response};
pub use mocks::{FailingEmbedder, KeywordEmbedder, ScriptedGenerator};
