//! Question processing.
//!
//! This module provides:
//! - Pipeline options
//! - The round scheduler for iterative decomposition
//! - Result aggregation
//! - Single-shot mode and `<answer>` canonicalization
//! - The [`TableQaPipeline`] entry point

mod aggregator;
mod answer;
mod engine;
mod options;
mod scheduler;
mod single_shot;

pub use aggregator::{
    manual_listing, synthesis_prompt, Aggregator, NO_RESULTS_ANSWER, UNDETERMINED_ANSWER,
};
pub use answer::{
    canonicalize_answer, extract_answer, has_answer_format, last_numeric_token, wrap_answer,
    ANSWER_CLOSE, ANSWER_OPEN,
};
pub use engine::{TableQaPipeline, TableQaPipelineBuilder};
pub use options::PipelineOptions;
pub use scheduler::{Scheduler, SchedulerRun};
pub use single_shot::{
    assistant_reply, single_shot_prompt, END_TO_END_STRATEGY, SINGLE_SHOT_FAILURE,
};
