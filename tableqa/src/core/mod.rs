//! Core domain model types for the engine.
//!
//! This module contains the fundamental types shared by every component:
//! - The input table
//! - Task kinds, strategies, sub-tasks and sub-task graphs
//! - Per-sub-task results and the per-question pipeline result

mod result;
mod table;
mod task;

pub use result::{
    IndependenceReport, PipelineResult, SubtaskResult, SubtaskStatus, TerminalState,
};
pub use table::{Table, DEFAULT_RENDER_ROWS};
pub use task::{Strategy, SubTask, SubTaskGraph, TaskType};
