//! One-way progress reporting from the batch worker to whoever presents it.
//!
//! The orchestrator only ever pushes [`ProgressEvent`]s into a
//! [`ProgressSink`]; it never reads presentation state back.

use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::processing::CompressionOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    /// `index` is 1-based.
    TaskStarted {
        index: usize,
        total: usize,
        filename: String,
        target_kb: u64,
    },
    TaskFinished {
        index: usize,
        total: usize,
        outcome: CompressionOutcome,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

pub trait ProgressSink {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Forwards events to another thread. A dropped receiver is ignored.
impl ProgressSink for Sender<ProgressEvent> {
    fn on_event(&self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}

/// Writes one JSON object per event to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesProgress;

impl ProgressSink for JsonLinesProgress {
    fn on_event(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{}", line);
        }
    }
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { total } => self.bar.set_length(total as u64),
            ProgressEvent::TaskStarted { filename, .. } => self.bar.set_message(filename),
            ProgressEvent::TaskFinished { .. } => self.bar.inc(1),
            ProgressEvent::BatchFinished { succeeded, failed } => self
                .bar
                .finish_with_message(format!("{} succeeded, {} failed", succeeded, failed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_sender_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        tx.on_event(ProgressEvent::BatchStarted { total: 3 });
        tx.on_event(ProgressEvent::BatchFinished {
            succeeded: 2,
            failed: 1,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ProgressEvent::BatchStarted { total: 3 });
    }

    #[test]
    fn test_sender_sink_ignores_closed_channel() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        tx.on_event(ProgressEvent::BatchStarted { total: 1 });
    }

    #[test]
    fn test_event_json_shape() {
        let event = ProgressEvent::TaskStarted {
            index: 1,
            total: 2,
            filename: "a.jpg".to_string(),
            target_kb: 250,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "task_started");
        assert_eq!(json["filename"], "a.jpg");
        assert_eq!(json["target_kb"], 250);
    }

    #[test]
    fn test_finished_event_carries_outcome() {
        let outcome = CompressionOutcome::failed("bad.jpg", 250, "decode failed");
        let event = ProgressEvent::TaskFinished {
            index: 1,
            total: 1,
            outcome,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"]["success"], false);
        assert_eq!(json["outcome"]["error"], "decode failed");
    }
}
