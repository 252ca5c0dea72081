//! Observability utilities.

mod subscriber;

pub use subscriber::{env_filter, init_tracing, TracingFormat, DEFAULT_FILTER};
