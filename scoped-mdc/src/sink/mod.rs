//! Ambient context sinks.
//!
//! A sink holds exactly one current value per key and is what logging code
//! reads. Scopes keep the sink in step with their stacks; the sink itself
//! knows nothing about nesting.

pub mod mdc;
mod sinks;

pub use mdc::Mdc;
pub use sinks::{ContextSink, LoggingContextSink, NoOpContextSink};

use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

static GLOBAL_CONTEXT_SINK: RwLock<Option<Arc<dyn ContextSink>>> = RwLock::new(None);
static DEFAULT_CONTEXT_SINK: OnceLock<Arc<dyn ContextSink>> = OnceLock::new();

/// Sets the process-wide sink used by [`crate::ScopedContext::global`].
///
/// Managers already constructed keep the sink they were built with.
pub fn set_context_sink(sink: Arc<dyn ContextSink>) {
    *GLOBAL_CONTEXT_SINK.write() = Some(sink);
    tracing::debug!("Global context sink installed");
}

/// Clears the process-wide sink, restoring the thread-local [`Mdc`].
pub fn clear_context_sink() {
    *GLOBAL_CONTEXT_SINK.write() = None;
}

/// Gets the process-wide sink.
///
/// Returns a shared [`Mdc`] if no sink is set. Every call made while the
/// same sink is installed returns the same `Arc`.
pub fn get_context_sink() -> Arc<dyn ContextSink> {
    GLOBAL_CONTEXT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| {
            DEFAULT_CONTEXT_SINK
                .get_or_init(|| Arc::new(Mdc))
                .clone()
        })
}
