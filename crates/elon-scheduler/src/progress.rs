//! Progress reporting (§4.7: "The Scheduler reports progress via a
//! structured callback `(phase, message, detail, level)`; it does not
//! drive UI directly").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: String,
    pub message: String,
    pub detail: Option<String>,
    pub level: ProgressLevel,
}

/// Receives one [`ProgressEvent`] per notable step. Implementations must
/// not block the driver for long — this is a reporting hook, not a gate.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);

    fn info(&self, phase: &str, message: &str) {
        self.report(ProgressEvent {
            phase: phase.to_string(),
            message: message.to_string(),
            detail: None,
            level: ProgressLevel::Info,
        });
    }

    fn warn(&self, phase: &str, message: &str, detail: &str) {
        self.report(ProgressEvent {
            phase: phase.to_string(),
            message: message.to_string(),
            detail: Some(detail.to_string()),
            level: ProgressLevel::Warn,
        });
    }
}

/// Default sink: forwards every event to `tracing`.
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&self, event: ProgressEvent) {
        match event.level {
            ProgressLevel::Info => tracing::info!(phase = %event.phase, detail = ?event.detail, "{}", event.message),
            ProgressLevel::Warn => tracing::warn!(phase = %event.phase, detail = ?event.detail, "{}", event.message),
            ProgressLevel::Error => tracing::error!(phase = %event.phase, detail = ?event.detail, "{}", event.message),
        }
    }
}

/// Records every event in order, for tests and for `elon status --json`
/// snapshots of the current run.
#[derive(Default)]
pub struct RecordingProgressSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingProgressSink::new();
        sink.info("cycle", "starting");
        sink.warn("cycle", "dismissed", "near-duplicate");
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "starting");
        assert_eq!(events[1].level, ProgressLevel::Warn);
        assert_eq!(events[1].detail.as_deref(), Some("near-duplicate"));
    }
}
