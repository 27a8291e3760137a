//! The default ambient sink: a thread-local key-value map.
//!
//! Log formatters and other readers on the same thread use [`get`] and
//! [`snapshot`] to observe the current diagnostic context.

use super::ContextSink;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static MDC: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// Handle to the calling thread's diagnostic context map.
///
/// Every thread sees its own map; the handle itself carries no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mdc;

impl ContextSink for Mdc {
    fn set(&self, key: &str, value: &str) {
        MDC.with(|mdc| {
            mdc.borrow_mut().insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        MDC.with(|mdc| {
            mdc.borrow_mut().remove(key);
        });
    }

    fn get(&self, key: &str) -> Option<String> {
        get(key)
    }
}

/// Returns the current value for a key on this thread.
#[must_use]
pub fn get(key: &str) -> Option<String> {
    MDC.with(|mdc| mdc.borrow().get(key).cloned())
}

/// Returns true if the key has a value on this thread.
#[must_use]
pub fn contains_key(key: &str) -> bool {
    MDC.with(|mdc| mdc.borrow().contains_key(key))
}

/// Returns a copy of this thread's whole context.
#[must_use]
pub fn snapshot() -> HashMap<String, String> {
    MDC.with(|mdc| mdc.borrow().clone())
}

/// Returns the number of keys set on this thread.
#[must_use]
pub fn len() -> usize {
    MDC.with(|mdc| mdc.borrow().len())
}
