//! The scoped context manager.

use super::future::InContext;
use super::guard::ScopeGuard;
use crate::config::{global_config, ContextConfig, UnbalancedPopPolicy};
use crate::errors::{MdcError, MdcResult};
use crate::pairs::ContextPairs;
use crate::sink::{get_context_sink, ContextSink};
use crate::stack::{ContextStacks, Popped};
use crate::timing::OperationTimer;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Identifies one set of per-thread stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StacksId {
    /// A manager built with [`ScopedContext::new`] and its clones.
    Manager(u64),
    /// Managers built with [`ScopedContext::global`], keyed by sink address.
    Sink(usize),
}

impl StacksId {
    fn for_sink(sink: &Arc<dyn ContextSink>) -> Self {
        Self::Sink(Arc::as_ptr(sink).cast::<()>() as usize)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // One entry per sink a manager writes to, so that scopes never restore
    // values into a sink that did not receive the matching push.
    static STACKS: RefCell<HashMap<StacksId, ContextStacks>> = RefCell::new(HashMap::new());
}

fn with_stacks<R>(id: StacksId, f: impl FnOnce(&mut ContextStacks) -> R) -> R {
    STACKS.with(|cell| {
        let mut all = cell.borrow_mut();
        let stacks = all.entry(id).or_default();
        let result = f(stacks);
        let empty = stacks.is_empty();
        if empty {
            all.remove(&id);
        }
        result
    })
}

/// Runs units of work with temporarily augmented diagnostic context.
///
/// Each manager writes to one [`ContextSink`] and keeps its own per-thread
/// stacks. Clones share both. Stacks live in thread-local storage, so
/// synchronous scopes must begin and end on the same thread; use
/// [`ScopedContext::in_context`] for futures, which may move between
/// threads while suspended.
#[derive(Clone)]
pub struct ScopedContext {
    id: StacksId,
    sink: Arc<dyn ContextSink>,
    config: Arc<ContextConfig>,
}

impl ScopedContext {
    /// Creates a manager writing to `sink`, with default configuration.
    #[must_use]
    pub fn new(sink: Arc<dyn ContextSink>) -> Self {
        Self {
            id: StacksId::Manager(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            sink,
            config: Arc::new(ContextConfig::default()),
        }
    }

    /// Returns the process-wide manager.
    ///
    /// It writes to the sink from [`crate::sink::get_context_sink`] (the
    /// thread-local [`crate::Mdc`] unless replaced) and uses
    /// [`crate::config::global_config`]. Global managers writing to the same
    /// sink share their stacks; replacing the sink mid-scope starts a fresh
    /// set, and scopes opened earlier keep popping from their own.
    #[must_use]
    pub fn global() -> Self {
        let sink = get_context_sink();
        Self {
            id: StacksId::for_sink(&sink),
            sink,
            config: global_config(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Returns the sink this manager writes to.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn ContextSink> {
        &self.sink
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub(crate) fn push(&self, key: &str, value: &str) {
        let depth = with_stacks(self.id, |stacks| {
            stacks.push(key, value);
            stacks.depth(key)
        });
        self.sink.set(key, value);

        if self.config.log_transitions {
            trace!(context_key = %key, context_value = %value, depth, "Context pushed");
        }
    }

    /// Pops one value for `key` and brings the sink in line with the stack.
    ///
    /// An unbalanced pop is logged and returned; the caller decides when to
    /// apply the policy so that the remaining keys still get popped.
    pub(crate) fn pop(&self, key: &str) -> MdcResult<()> {
        let popped = with_stacks(self.id, |stacks| stacks.pop(key)).map_err(|err| {
            error!(error = %err, "Context stack invariant violated");
            err
        })?;

        match popped {
            Popped::Restored(top) => {
                self.sink.set(key, &top);
                if self.config.log_transitions {
                    trace!(context_key = %key, restored = %top, "Context popped");
                }
            }
            Popped::Exhausted => {
                self.sink.remove(key);
                if self.config.log_transitions {
                    trace!(context_key = %key, "Context removed");
                }
            }
        }
        Ok(())
    }

    pub(crate) fn enforce_balance(&self, err: &MdcError) {
        if self.config.on_unbalanced_pop == UnbalancedPopPolicy::Panic && !std::thread::panicking() {
            panic!("{err}");
        }
    }

    /// Pushes `pairs` and returns a guard that pops them when dropped.
    ///
    /// The guard is bound to the current thread.
    pub fn enter(&self, pairs: impl Into<ContextPairs>) -> ScopeGuard {
        ScopeGuard::enter(self.clone(), &pairs.into())
    }

    /// Runs `f` with `pairs` added to the context.
    ///
    /// The previous context is restored however `f` exits: by returning
    /// (including an `Err` value) or by panicking. The result is returned
    /// unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use scoped_mdc::{mdc, ScopedContext};
    ///
    /// let ctx = ScopedContext::global();
    /// let id = ctx.run([("request_id", "42")], || mdc::get("request_id"));
    /// assert_eq!(id.as_deref(), Some("42"));
    /// assert_eq!(mdc::get("request_id"), None);
    /// ```
    pub fn run<T, F>(&self, pairs: impl Into<ContextPairs>, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _guard = self.enter(pairs);
        f()
    }

    /// Runs `f` with every key of `pairs` prefixed by `prefix`.
    pub fn run_with_prefix<T, F>(&self, pairs: impl Into<ContextPairs>, prefix: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.run(pairs.into().with_prefix(prefix), f)
    }

    /// Runs `f` with `pairs`, then runs `observer` with the elapsed time.
    ///
    /// While `observer` runs, the configured timing key (default
    /// `operationTimeMs`) holds the whole milliseconds `f` took. The key is
    /// removed before the outer pairs. If `f` panics, `observer` never runs.
    pub fn run_timed<T, F, O>(&self, pairs: impl Into<ContextPairs>, f: F, observer: O) -> T
    where
        F: FnOnce() -> T,
        O: FnOnce(&T),
    {
        let _guard = self.enter(pairs);
        let timer = OperationTimer::start();
        let value = f();
        self.observe(timer, &value, observer);
        value
    }

    /// Like [`ScopedContext::run_timed`] for fallible work.
    ///
    /// An `Err` from `f` skips `observer` and the timing key and is returned
    /// unchanged after the context is restored.
    pub fn try_run_timed<T, E, F, O>(
        &self,
        pairs: impl Into<ContextPairs>,
        f: F,
        observer: O,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        O: FnOnce(&T),
    {
        let _guard = self.enter(pairs);
        let timer = OperationTimer::start();
        let value = f()?;
        self.observe(timer, &value, observer);
        Ok(value)
    }

    fn observe<T, O>(&self, timer: OperationTimer, value: &T, observer: O)
    where
        O: FnOnce(&T),
    {
        let elapsed = timer.finish();
        let _timing = self.enter([(self.config.timing_key.as_str(), elapsed.to_string())]);
        observer(value);
    }

    /// Wraps a future so that `pairs` are in context whenever it is polled.
    pub fn in_context<F>(&self, pairs: impl Into<ContextPairs>, future: F) -> InContext<F>
    where
        F: Future,
    {
        InContext::new(self.clone(), pairs.into(), future)
    }

    /// Awaits `future` within `pairs`, then runs `observer` with the timing
    /// key set to the milliseconds elapsed since the first poll.
    pub async fn timed_in_context<F, O>(
        &self,
        pairs: impl Into<ContextPairs>,
        future: F,
        observer: O,
    ) -> F::Output
    where
        F: Future,
        O: FnOnce(&F::Output),
    {
        let pairs = pairs.into();
        let timer = OperationTimer::start();
        let value = self.in_context(pairs.clone(), future).await;

        {
            let _guard = self.enter(pairs);
            self.observe(timer, &value, observer);
        }

        value
    }

    /// Returns the current value of a key pushed through this manager.
    #[must_use]
    pub fn current(&self, key: &str) -> Option<String> {
        with_stacks(self.id, |stacks| stacks.top(key).map(String::from))
    }

    /// Returns how many scopes on this thread currently push `key`.
    #[must_use]
    pub fn depth(&self, key: &str) -> usize {
        with_stacks(self.id, |stacks| stacks.depth(key))
    }

    /// Returns the current value of every key pushed through this manager.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        with_stacks(self.id, |stacks: &mut ContextStacks| stacks.snapshot())
    }

    /// Drops all context this manager holds on the current thread.
    ///
    /// Every key is removed from the sink. Intended for pooled threads
    /// between jobs; guards still alive afterwards will report an
    /// unbalanced pop. Returns the number of keys cleared.
    pub fn reset_current(&self) -> usize {
        let keys = with_stacks(self.id, ContextStacks::clear);
        for key in &keys {
            self.sink.remove(key);
        }

        if !keys.is_empty() {
            warn!(count = keys.len(), keys = ?keys, "Cleared leftover diagnostic context");
        }

        keys.len()
    }
}

impl Default for ScopedContext {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Debug for ScopedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedContext")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
