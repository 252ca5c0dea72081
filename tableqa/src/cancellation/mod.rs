//! Cooperative cancellation and deadlines for collaborator calls.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - CallScope, which bounds every generation and embedding call

mod scope;
mod token;

pub use scope::{CallScope, Interrupted};
pub use token::CancellationToken;
