//! Per-key LIFO stacks of context values.

use crate::errors::{MdcError, MdcResult};
use std::collections::HashMap;

/// Outcome of popping a key's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped {
    /// An enclosing value remains and is now current.
    Restored(String),
    /// The stack is exhausted; the key has no current value.
    Exhausted,
}

/// Execution-context state: a LIFO stack of values for each key.
///
/// Keys with empty stacks are removed eagerly, so `len` counts only keys
/// that currently have a value.
#[derive(Debug, Clone, Default)]
pub struct ContextStacks {
    stacks: HashMap<String, Vec<String>>,
}

impl ContextStacks {
    /// Creates empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a value for a key, making it the current value.
    pub fn push(&mut self, key: &str, value: &str) {
        self.stacks
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Pops the current value for a key.
    ///
    /// # Errors
    ///
    /// Returns [`MdcError::UnbalancedPop`] if nothing is pushed for the key.
    /// Other keys are left untouched.
    pub fn pop(&mut self, key: &str) -> MdcResult<Popped> {
        let stack = self
            .stacks
            .get_mut(key)
            .ok_or_else(|| MdcError::unbalanced_pop(key))?;

        stack.pop();
        if let Some(top) = stack.last() {
            return Ok(Popped::Restored(top.clone()));
        }

        self.stacks.remove(key);
        Ok(Popped::Exhausted)
    }

    /// Returns the current value for a key.
    #[must_use]
    pub fn top(&self, key: &str) -> Option<&str> {
        self.stacks
            .get(key)
            .and_then(|stack| stack.last())
            .map(String::as_str)
    }

    /// Returns how many values are pushed for a key.
    #[must_use]
    pub fn depth(&self, key: &str) -> usize {
        self.stacks.get(key).map_or(0, Vec::len)
    }

    /// Returns the number of keys with a current value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Returns true if no key has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Returns all keys with a current value.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.stacks.keys().cloned().collect()
    }

    /// Returns the current value of every key.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.stacks
            .iter()
            .filter_map(|(k, stack)| stack.last().map(|v| (k.clone(), v.clone())))
            .collect()
    }

    /// Removes every stack, returning the keys that were present.
    pub fn clear(&mut self) -> Vec<String> {
        self.stacks.drain().map(|(k, _)| k).collect()
    }
}
