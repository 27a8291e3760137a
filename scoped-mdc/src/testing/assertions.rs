//! Assertions for diagnostic context.

use crate::sink::{mdc, ContextSink};
use std::collections::HashMap;

/// Asserts that the thread-local MDC holds `expected` for `key`.
pub fn assert_mdc_eq(key: &str, expected: &str) {
    let actual = mdc::get(key);
    assert_eq!(
        actual.as_deref(),
        Some(expected),
        "Expected MDC key '{}' to be {:?}, got {:?}",
        key,
        expected,
        actual
    );
}

/// Asserts that the thread-local MDC has no value for `key`.
pub fn assert_mdc_absent(key: &str) {
    let actual = mdc::get(key);
    assert!(
        actual.is_none(),
        "Expected MDC key '{}' to be absent, got {:?}",
        key,
        actual
    );
}

/// Asserts that the thread-local MDC equals an earlier snapshot.
pub fn assert_mdc_unchanged(before: &HashMap<String, String>) {
    let after = mdc::snapshot();
    assert_eq!(
        &after, before,
        "Expected MDC to be restored to {:?}, got {:?}",
        before, after
    );
}

/// Asserts that a sink holds `expected` for `key`.
pub fn assert_sink_eq(sink: &dyn ContextSink, key: &str, expected: &str) {
    let actual = sink.get(key);
    assert_eq!(
        actual.as_deref(),
        Some(expected),
        "Expected sink key '{}' to be {:?}, got {:?}",
        key,
        expected,
        actual
    );
}

/// Asserts that a sink has no value for `key`.
pub fn assert_sink_absent(sink: &dyn ContextSink, key: &str) {
    let actual = sink.get(key);
    assert!(
        actual.is_none(),
        "Expected sink key '{}' to be absent, got {:?}",
        key,
        actual
    );
}
