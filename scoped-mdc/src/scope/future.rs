//! Futures carrying their diagnostic context across polls.

use super::guard::ScopeGuard;
use super::manager::ScopedContext;
use crate::pairs::ContextPairs;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that has its pairs in context while it is being polled.
///
/// The pairs are pushed at the start of every poll and popped at its end,
/// on whichever thread runs the poll. Between polls nothing is left on any
/// thread, so a task that migrates between workers keeps its context and
/// dropping the future early leaks nothing.
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct InContext<F> {
    #[pin]
    inner: F,
    context: ScopedContext,
    pairs: ContextPairs,
}

impl<F> InContext<F> {
    pub(crate) const fn new(context: ScopedContext, pairs: ContextPairs, inner: F) -> Self {
        Self {
            inner,
            context,
            pairs,
        }
    }

    /// Returns the pairs applied on each poll.
    pub const fn pairs(&self) -> &ContextPairs {
        &self.pairs
    }
}

impl<F: Future> Future for InContext<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = ScopeGuard::enter(this.context.clone(), this.pairs);
        this.inner.poll(cx)
    }
}

impl<F> std::fmt::Debug for InContext<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InContext")
            .field("pairs", &self.pairs)
            .finish_non_exhaustive()
    }
}
