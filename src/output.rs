//! Informational output channel.
//!
//! The library reports every mutation (and, in debug mode, its reasoning) as
//! human-readable lines on a single channel. The channel is a trait so tests
//! and embedding applications can capture or redirect it.

use std::sync::Arc;

/// Sink for human-readable informational lines.
///
/// No structured output contract is promised; lines are for operators.
pub trait InfoSink: Send + Sync + std::fmt::Debug {
    /// Emit one line.
    fn line(&self, text: &str);
}

/// Default sink writing to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl InfoSink for StdoutSink {
    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// Returns the default informational sink.
#[must_use]
pub fn default_sink() -> Arc<dyn InfoSink> {
    Arc::new(StdoutSink)
}
