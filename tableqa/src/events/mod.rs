//! Event sinks for pipeline lifecycle events.
//!
//! This module provides:
//! - The [`EventSink`] trait and its no-op, logging and collecting
//!   implementations
//! - [`EventKind`], the set of events the scheduler emits

mod kinds;
mod sink;

pub use kinds::EventKind;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
