//! Context management for question processing.
//!
//! The execution context maps completed sub-task ids to their result text.
//! It is created fresh for every question and never shared.

mod execution;

pub use execution::ExecutionContext;
