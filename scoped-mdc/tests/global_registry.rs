//! Integration tests for the process-wide sink and configuration.
//!
//! These tests mutate global state, so they serialize on a lock.

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use scoped_mdc::config::{clear_global_config, global_config, set_global_config};
use scoped_mdc::prelude::*;
use scoped_mdc::testing::{assert_mdc_absent, assert_mdc_eq, RecordingSink, SinkOp};
use std::sync::Arc;

static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_default_global_sink_is_mdc() {
    let _lock = GLOBAL_LOCK.lock();
    clear_context_sink();

    let sink = get_context_sink();
    with_context([("global.default.k", "v")], || {
        assert_eq!(sink.get("global.default.k").as_deref(), Some("v"));
        assert_eq!(mdc::get("global.default.k").as_deref(), Some("v"));
    });
    assert_mdc_absent("global.default.k");
}

#[test]
fn test_installed_sink_receives_free_function_scopes() {
    let _lock = GLOBAL_LOCK.lock();
    let recording = Arc::new(RecordingSink::new());
    set_context_sink(recording.clone());

    with_prefixed_context([("id", "7")], "req.", || {
        with_context([("req.id", "8")], || {});
    });

    clear_context_sink();

    assert_eq!(
        recording.ops(),
        vec![
            SinkOp::set("req.id", "7"),
            SinkOp::set("req.id", "8"),
            SinkOp::set("req.id", "7"),
            SinkOp::remove("req.id"),
        ]
    );
    assert_mdc_absent("req.id");
}

#[test]
fn test_global_config_timing_key() {
    let _lock = GLOBAL_LOCK.lock();
    clear_context_sink();
    set_global_config(ContextConfig::new().with_timing_key("tookMs")).unwrap();

    let mut seen = None;
    with_timed_context([("global.timed.op", "x")], || (), |_| {
        seen = mdc::get("tookMs");
    });

    clear_global_config();

    assert!(seen.is_some());
    assert_mdc_absent("tookMs");
    assert_eq!(global_config().timing_key, "operationTimeMs");
}

#[test]
fn test_invalid_global_config_rejected() {
    let _lock = GLOBAL_LOCK.lock();
    let err = set_global_config(ContextConfig::new().with_timing_key("")).unwrap_err();
    assert!(matches!(err, MdcError::InvalidConfig(_)));
    assert_eq!(global_config().timing_key, "operationTimeMs");
}

#[test]
fn test_logging_sink_as_global() {
    let _lock = GLOBAL_LOCK.lock();
    set_context_sink(Arc::new(LoggingContextSink::default()));

    with_context([("global.logging.k", "v")], || {
        assert_eq!(mdc::get("global.logging.k").as_deref(), Some("v"));
    });

    clear_context_sink();
    assert_mdc_absent("global.logging.k");
}

#[test]
fn test_sink_swapped_between_nested_scopes() {
    let _lock = GLOBAL_LOCK.lock();
    let recording = Arc::new(RecordingSink::new());
    set_context_sink(recording.clone());

    with_context([("global.swap.k", "outer")], || {
        clear_context_sink();

        with_context([("global.swap.k", "inner")], || {
            assert_mdc_eq("global.swap.k", "inner");
        });

        assert_mdc_absent("global.swap.k");
        assert_eq!(recording.get("global.swap.k").as_deref(), Some("outer"));
    });

    assert_mdc_absent("global.swap.k");
    assert!(recording.is_empty());
    assert_eq!(
        recording.ops(),
        vec![
            SinkOp::set("global.swap.k", "outer"),
            SinkOp::remove("global.swap.k"),
        ]
    );
}

#[test]
fn test_default_sink_nesting_across_global_managers() {
    let _lock = GLOBAL_LOCK.lock();
    clear_context_sink();

    let outer = ScopedContext::global();
    let inner = ScopedContext::global();

    outer.run([("global.shared.k", "a")], || {
        inner.run([("global.shared.k", "b")], || {
            assert_eq!(outer.depth("global.shared.k"), 2);
        });
        assert_mdc_eq("global.shared.k", "a");
    });

    assert_mdc_absent("global.shared.k");
}
