//! Progress event emission.
//!
//! The packager reports each step of a run as a structured `ProgressEvent`
//! through a `ProgressEmitter`. Emitters decide where events go: a JSONL
//! stream, a caller-supplied callback, or nowhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

/// Standard progress event names.
pub mod event_names {
    pub const BUILD_STARTED: &str = "build_started";
    pub const IMPORTING: &str = "importing";
    pub const BUILDING: &str = "building";
    pub const ITEM_ADDED: &str = "item_added";
    pub const BUILD_FINISHED: &str = "build_finished";
    pub const BUILD_ABORTED: &str = "build_aborted";
}

/// Packaging phase a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Importing,
    Building,
    Finalizing,
    CleaningUp,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Start => write!(f, "start"),
            Phase::Importing => write!(f, "importing"),
            Phase::Building => write!(f, "building"),
            Phase::Finalizing => write!(f, "finalizing"),
            Phase::CleaningUp => write!(f, "cleaning_up"),
        }
    }
}

/// Progress counters for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Structured progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl ProgressEvent {
    pub fn new(event: impl Into<String>, phase: Phase) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            run_id: None,
            phase,
            progress: None,
            details: HashMap::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_progress(mut self, current: u64, total: Option<u64>) -> Self {
        self.progress = Some(Progress { current, total });
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    /// String detail by key.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Trait for emitting progress events.
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Emitter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmitter;

impl ProgressEmitter for NullEmitter {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Adapts a closure into a `ProgressEmitter`.
pub struct CallbackEmitter<F> {
    callback: F,
}

impl<F> CallbackEmitter<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressEmitter for CallbackEmitter<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        (self.callback)(&event);
    }
}

/// JSONL writer for progress events.
pub struct JsonlWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressEmitter for JsonlWriter<W> {
    fn emit(&self, event: ProgressEvent) {
        let line = event.to_jsonl();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_progress_event_jsonl() {
        let event = ProgressEvent::new(event_names::ITEM_ADDED, Phase::Building)
            .with_run_id("run-1")
            .with_progress(1, Some(5))
            .with_detail("item", "readme.md");
        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"item_added""#));
        assert!(json.contains(r#""run_id":"run-1""#));
        assert!(json.contains(r#""phase":"building""#));
        assert_eq!(event.detail_str("item"), Some("readme.md"));
    }

    #[test]
    fn test_jsonl_writer_writes_lines() {
        let writer = JsonlWriter::new(Vec::new());
        writer.emit(ProgressEvent::new(event_names::BUILD_STARTED, Phase::Start));
        writer.emit(ProgressEvent::new(event_names::IMPORTING, Phase::Importing));

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: ProgressEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.phase, Phase::Importing);
    }

    #[test]
    fn test_callback_emitter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let emitter = CallbackEmitter::new(move |event: &ProgressEvent| {
            sink.lock().unwrap().push((event.phase, event.event.clone()));
        });

        emitter.emit(ProgressEvent::new(event_names::BUILDING, Phase::Building));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(Phase::Building, "building".to_string())]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::CleaningUp.to_string(), "cleaning_up");
        assert_eq!(
            serde_json::to_string(&Phase::CleaningUp).unwrap(),
            "\"cleaning_up\""
        );
    }
}
