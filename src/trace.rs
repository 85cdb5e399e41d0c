//! Structured event stream for the external visualizer.
//!
//! The pipeline reports fixed checkpoints as line-oriented records:
//! the label, a space, and a JSON array of payload values. A `Trace`
//! is threaded through every stage explicitly; `Trace::disabled()` is
//! the no-op default, so the core never consults a global flag.

use serde_json::Value;
use std::io::Write;

pub struct Trace<'w> {
    sink: Option<&'w mut dyn Write>,
}

impl<'w> Trace<'w> {
    pub fn disabled() -> Trace<'static> {
        Trace { sink: None }
    }

    pub fn to_writer(sink: &'w mut dyn Write) -> Trace<'w> {
        Trace { sink: Some(sink) }
    }

    pub fn enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit a checkpoint with a payload. The payload closure only runs
    /// when a sink is attached. Write failures are swallowed; tracing
    /// never aborts assembly.
    pub fn emit<F>(&mut self, label: &str, payload: F)
    where
        F: FnOnce() -> Value,
    {
        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{} {}", label, payload());
        }
    }

    /// Emit a bare checkpoint label.
    pub fn checkpoint(&mut self, label: &str) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = writeln!(sink, "{}", label);
        }
    }
}
