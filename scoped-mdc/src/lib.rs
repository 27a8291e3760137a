//! # Scoped MDC
//!
//! Scoped, nestable key-value diagnostic context for structured logging.
//!
//! A scope pushes a set of key-value pairs before running a unit of work.
//! Every log statement executed within that unit can read them from the
//! ambient context sink. When the unit exits, by returning, by returning an
//! error or by panicking, the pairs are popped again and whatever context
//! existed before is restored:
//!
//! - **Per-key stacking**: nested scopes may push the same key; leaving the
//!   inner scope restores the outer value instead of blanking the key
//! - **Guaranteed restoration**: teardown is driven by an RAII guard
//! - **Timed scopes**: expose the elapsed time under `operationTimeMs`
//!   to an observer, typically a log statement
//! - **Async scopes**: futures carry their context from poll to poll, even
//!   when the runtime moves them between threads
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_mdc::{mdc, with_context, with_prefixed_context};
//!
//! with_context([("request_id", "r-1")], || {
//!     assert_eq!(mdc::get("request_id").as_deref(), Some("r-1"));
//!
//!     with_context([("request_id", "r-2")], || {
//!         assert_eq!(mdc::get("request_id").as_deref(), Some("r-2"));
//!     });
//!
//!     assert_eq!(mdc::get("request_id").as_deref(), Some("r-1"));
//! });
//! assert_eq!(mdc::get("request_id"), None);
//!
//! with_prefixed_context([("id", "7")], "req.", || {
//!     assert_eq!(mdc::get("req.id").as_deref(), Some("7"));
//! });
//! ```
//!
//! ## Threads and tasks
//!
//! Synchronous scopes keep their stacks in thread-local storage and must
//! begin and end on the same thread. Work that suspends should use
//! [`in_context`], which re-applies the context on every poll so that it
//! follows the task rather than the worker thread.

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

pub mod config;
pub mod errors;
pub mod pairs;
pub mod scope;
pub mod sink;
pub mod stack;
pub mod testing;
pub mod timing;

pub use config::{ContextConfig, UnbalancedPopPolicy};
pub use errors::{MdcError, MdcResult};
pub use pairs::ContextPairs;
pub use scope::{
    enter, in_context, timed_in_context, try_with_timed_context, with_context,
    with_prefixed_context, with_timed_context, InContext, ScopeGuard, ScopedContext,
};
pub use sink::{mdc, ContextSink, LoggingContextSink, Mdc, NoOpContextSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ContextConfig, UnbalancedPopPolicy};
    pub use crate::errors::{MdcError, MdcResult};
    pub use crate::pairs::ContextPairs;
    pub use crate::scope::{
        enter, in_context, timed_in_context, try_with_timed_context, with_context,
        with_prefixed_context, with_timed_context, InContext, ScopeGuard, ScopedContext,
    };
    pub use crate::sink::{
        clear_context_sink, get_context_sink, mdc, set_context_sink, ContextSink,
        LoggingContextSink, Mdc, NoOpContextSink,
    };
}
