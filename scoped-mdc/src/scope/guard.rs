//! RAII guard restoring context on drop.

use super::manager::ScopedContext;
use crate::pairs::ContextPairs;
use std::marker::PhantomData;

/// Pops the pairs of one scope when dropped, innermost key first.
///
/// Dropping runs on every exit path, including panics, so the previous
/// context is always restored. The guard cannot leave the thread that
/// created it, since the stacks it pops are thread-local.
#[must_use = "context is removed as soon as the guard is dropped"]
pub struct ScopeGuard {
    context: ScopedContext,
    keys: Vec<String>,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    pub(crate) fn enter(context: ScopedContext, pairs: &ContextPairs) -> Self {
        let mut guard = Self {
            context,
            keys: Vec::with_capacity(pairs.len()),
            _not_send: PhantomData,
        };

        for (key, value) in pairs.iter() {
            guard.context.push(key, value);
            guard.keys.push(key.to_string());
        }

        guard
    }

    /// Returns the keys this guard will pop, in push order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let mut first_violation = None;
        for key in self.keys.iter().rev() {
            if let Err(err) = self.context.pop(key) {
                first_violation.get_or_insert(err);
            }
        }

        if let Some(err) = first_violation {
            self.context.enforce_balance(&err);
        }
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
