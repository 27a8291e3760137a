//! Testing utilities for code that relies on scoped context.
//!
//! This module provides:
//! - A recording sink that remembers every change
//! - Assertions against the thread-local MDC and arbitrary sinks

mod assertions;
mod recording;

pub use assertions::{
    assert_mdc_absent, assert_mdc_eq, assert_mdc_unchanged, assert_sink_absent, assert_sink_eq,
};
pub use recording::{RecordingSink, SinkOp};
