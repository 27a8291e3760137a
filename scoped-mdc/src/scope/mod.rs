//! Scoped diagnostic context.
//!
//! This module provides:
//! - `ScopedContext`, the manager pushing and restoring context
//! - `ScopeGuard` for RAII-style scopes
//! - `InContext` for futures that keep their context across threads
//! - Free functions running work in the process-wide manager

mod future;
mod guard;
mod manager;

pub use future::InContext;
pub use guard::ScopeGuard;
pub use manager::ScopedContext;

use crate::pairs::ContextPairs;
use std::future::Future;

/// Runs `f` with `pairs` in the process-wide context.
///
/// See [`ScopedContext::run`].
pub fn with_context<T, F>(pairs: impl Into<ContextPairs>, f: F) -> T
where
    F: FnOnce() -> T,
{
    ScopedContext::global().run(pairs, f)
}

/// Runs `f` with every key of `pairs` prefixed by `prefix`.
///
/// See [`ScopedContext::run_with_prefix`].
pub fn with_prefixed_context<T, F>(pairs: impl Into<ContextPairs>, prefix: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    ScopedContext::global().run_with_prefix(pairs, prefix, f)
}

/// Runs `f` with `pairs`, then `observer` with the timing key set.
///
/// See [`ScopedContext::run_timed`].
pub fn with_timed_context<T, F, O>(pairs: impl Into<ContextPairs>, f: F, observer: O) -> T
where
    F: FnOnce() -> T,
    O: FnOnce(&T),
{
    ScopedContext::global().run_timed(pairs, f, observer)
}

/// Runs fallible `f` with `pairs`, observing only successful results.
///
/// See [`ScopedContext::try_run_timed`].
pub fn try_with_timed_context<T, E, F, O>(
    pairs: impl Into<ContextPairs>,
    f: F,
    observer: O,
) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    O: FnOnce(&T),
{
    ScopedContext::global().try_run_timed(pairs, f, observer)
}

/// Pushes `pairs` in the process-wide context until the guard drops.
pub fn enter(pairs: impl Into<ContextPairs>) -> ScopeGuard {
    ScopedContext::global().enter(pairs)
}

/// Wraps a future with `pairs` in the process-wide context.
pub fn in_context<F: Future>(pairs: impl Into<ContextPairs>, future: F) -> InContext<F> {
    ScopedContext::global().in_context(pairs, future)
}

/// Awaits `future` with `pairs`, then runs `observer` with the timing key set.
pub async fn timed_in_context<F, O>(pairs: impl Into<ContextPairs>, future: F, observer: O) -> F::Output
where
    F: Future,
    O: FnOnce(&F::Output),
{
    ScopedContext::global()
        .timed_in_context(pairs, future, observer)
        .await
}
