//! Progress reporting and cooperative cancellation.
//!
//! The runner only ever pushes into a sink; it never waits on the caller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Receiver of progress values in [0, 100] and log lines.
pub trait ProgressSink {
    fn progress(&mut self, percent: f64);
    fn message(&mut self, text: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&mut self, percent: f64) {
        log::debug!("progress {percent:.0}%");
    }

    fn message(&mut self, text: &str) {
        log::info!("{text}");
    }
}

/// Keeps everything it receives. Used by tooling and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    pub values:   Vec<f64>,
    pub messages: Vec<String>,
}

impl ProgressSink for RecordingProgress {
    fn progress(&mut self, percent: f64) {
        self.values.push(percent);
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

/// Clamps to [0, 100] and never reports a value lower than the last one.
pub struct Monotonic<'a> {
    sink: &'a mut dyn ProgressSink,
    last: f64,
}

impl<'a> Monotonic<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, last: 0.0 }
    }

    pub fn set(&mut self, percent: f64) {
        let value = percent.clamp(0.0, 100.0).max(self.last);
        self.last = value;
        self.sink.progress(value);
    }

    pub fn message(&mut self, text: &str) {
        self.sink.message(text);
    }
}

/// Shared cancel switch, checked between phases.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
