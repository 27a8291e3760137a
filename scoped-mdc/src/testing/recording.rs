//! Recording sink for tests.

use crate::sink::ContextSink;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A single change applied to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    /// A key was set.
    Set {
        /// The key.
        key: String,
        /// The value.
        value: String,
    },
    /// A key was removed.
    Remove {
        /// The key.
        key: String,
    },
}

impl SinkOp {
    /// Creates a set operation.
    #[must_use]
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a remove operation.
    #[must_use]
    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }

    /// Returns the key the operation touched.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// A sink that stores values and records every operation in order.
///
/// Unlike [`crate::Mdc`] its state is shared by all threads using it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    values: RwLock<HashMap<String, String>>,
    ops: RwLock<Vec<SinkOp>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn ops(&self) -> Vec<SinkOp> {
        self.ops.read().clone()
    }

    /// Returns the recorded operations touching a key.
    #[must_use]
    pub fn ops_for(&self, key: &str) -> Vec<SinkOp> {
        self.ops
            .read()
            .iter()
            .filter(|op| op.key() == key)
            .cloned()
            .collect()
    }

    /// Returns a copy of the current values.
    #[must_use]
    pub fn values(&self) -> HashMap<String, String> {
        self.values.read().clone()
    }

    /// Returns the number of keys with a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if no key has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Forgets recorded operations, keeping values.
    pub fn clear_ops(&self) {
        self.ops.write().clear();
    }
}

impl ContextSink for RecordingSink {
    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        self.ops.write().push(SinkOp::set(key, value));
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
        self.ops.write().push(SinkOp::remove(key));
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let sink = RecordingSink::new();
        sink.set("a", "1");
        sink.set("b", "2");
        sink.remove("a");

        assert_eq!(
            sink.ops(),
            vec![SinkOp::set("a", "1"), SinkOp::set("b", "2"), SinkOp::remove("a")]
        );
        assert_eq!(sink.ops_for("a").len(), 2);
        assert_eq!(sink.get("b"), Some("2".to_string()));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_clear_ops_keeps_values() {
        let sink = RecordingSink::new();
        sink.set("a", "1");
        sink.clear_ops();

        assert!(sink.ops().is_empty());
        assert!(!sink.is_empty());
    }
}
