//! # TableQA
//!
//! Question answering over tables by iterative task decomposition.
//!
//! A question is classified into a decomposition strategy, planned into a
//! graph of sub-tasks by a generation service, and executed round by round
//! in dependency order. Lookup-style sub-tasks are grounded with snippets
//! from keyword and hybrid retrieval over the table's cells. Sub-task
//! results are finally synthesized into one answer.
//!
//! Features:
//!
//! - **Planning with fallback**: model plans are parsed leniently and
//!   replaced by a per-strategy template when unusable
//! - **Round scheduling**: at most five rounds, ending completed, stalled,
//!   exhausted or cancelled
//! - **Retrieval fusion**: keyword scoring fused with BM25 and embedding
//!   similarity
//! - **Single-shot mode**: one call, canonicalized to `<answer>` form
//! - **Evaluation**: exact-match and format accuracy over labelled samples
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tableqa::prelude::*;
//!
//! let pipeline = TableQaPipeline::builder(generator)
//!     .with_options(PipelineOptions::new().with_max_iterations(5))
//!     .build();
//!
//! let result = pipeline.process_question("How many wins in total?", &table).await;
//! println!("{}", result.final_answer);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod context;
pub mod core;
pub mod errors;
pub mod evaluation;
pub mod events;
pub mod execution;
pub mod observability;
pub mod pipeline;
pub mod planning;
pub mod retrieval;
pub mod services;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CallScope, CancellationToken};
    pub use crate::context::ExecutionContext;
    pub use crate::core::{
        PipelineResult, Strategy, SubTask, SubTaskGraph, SubtaskResult, SubtaskStatus, Table,
        TaskType, TerminalState,
    };
    pub use crate::errors::{GenerationError, RetrievalError, TableQaError};
    pub use crate::evaluation::{evaluate, AnswerComparator, EvaluationMode, EvaluationSample};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{extract_answer, PipelineOptions, TableQaPipeline};
    pub use crate::retrieval::{RetrievalOptions, RetrievalRegistry, RetrievalResult};
    pub use crate::services::{
        EmbeddingService, GenerationParams, GenerationRequest, GenerationService,
    };
}
