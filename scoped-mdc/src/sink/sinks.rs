//! Context sink trait and implementations.

use super::Mdc;
use tracing::{debug, info, trace, Level};

/// Trait for ambient context sinks.
///
/// Implementations must make `set` and `remove` visible immediately to
/// subsequent reads on the same execution context.
pub trait ContextSink: Send + Sync {
    /// Sets the current value for a key.
    fn set(&self, key: &str, value: &str);

    /// Removes the key entirely.
    fn remove(&self, key: &str);

    /// Reads the current value for a key.
    fn get(&self, key: &str) -> Option<String>;
}

/// A sink that discards all context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpContextSink;

impl ContextSink for NoOpContextSink {
    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}

    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// A sink that logs every change using the tracing framework, then
/// forwards it to an inner sink.
#[derive(Debug, Clone)]
pub struct LoggingContextSink<S = Mdc> {
    inner: S,
    level: Level,
}

impl Default for LoggingContextSink<Mdc> {
    fn default() -> Self {
        Self::new(Mdc, Level::DEBUG)
    }
}

impl<S: ContextSink> LoggingContextSink<S> {
    /// Wraps a sink, logging at the given level.
    #[must_use]
    pub const fn new(inner: S, level: Level) -> Self {
        Self { inner, level }
    }

    /// Wraps a sink, logging at trace level.
    #[must_use]
    pub const fn trace(inner: S) -> Self {
        Self::new(inner, Level::TRACE)
    }

    /// Returns the wrapped sink.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn log_change(&self, key: &str, value: Option<&str>) {
        let action = if value.is_some() { "set" } else { "remove" };
        match self.level {
            Level::TRACE => {
                trace!(context_key = %key, context_value = ?value, "Context {}", action);
            }
            Level::DEBUG => {
                debug!(context_key = %key, context_value = ?value, "Context {}", action);
            }
            _ => {
                info!(context_key = %key, context_value = ?value, "Context {}", action);
            }
        }
    }
}

impl<S: ContextSink> ContextSink for LoggingContextSink<S> {
    fn set(&self, key: &str, value: &str) {
        self.log_change(key, Some(value));
        self.inner.set(key, value);
    }

    fn remove(&self, key: &str) {
        self.log_change(key, None);
        self.inner.remove(key);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, SinkOp};
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_noop_sink() {
        let sink = NoOpContextSink;
        sink.set("k", "v");
        assert_eq!(sink.get("k"), None);
        sink.remove("k");
    }

    #[test]
    fn test_logging_sink_forwards() {
        let sink = LoggingContextSink::new(RecordingSink::new(), Level::INFO);
        sink.set("k", "v");
        assert_eq!(sink.get("k"), Some("v".to_string()));
        sink.remove("k");
        assert_eq!(sink.get("k"), None);

        assert_eq!(
            sink.inner().ops(),
            vec![SinkOp::set("k", "v"), SinkOp::remove("k")]
        );
    }

    #[test]
    fn test_logging_sink_emits_events() {
        let writer = CaptureWriter::default();
        let captured = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = LoggingContextSink::trace(NoOpContextSink);
            sink.set("request_id", "abc");
            sink.remove("request_id");
        });

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("Context set"));
        assert!(output.contains("Context remove"));
        assert!(output.contains("request_id"));
    }
}
