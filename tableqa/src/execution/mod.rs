//! Sub-task execution.
//!
//! This module provides:
//! - The [`Executor`], which gathers retrieval snippets for lookup-style
//!   sub-tasks and makes one generation call per sub-task
//! - The execution prompt builder

mod executor;
mod prompt;

pub use executor::Executor;
pub use prompt::{execution_prompt, EXECUTION_CONTEXT_HEADING};
