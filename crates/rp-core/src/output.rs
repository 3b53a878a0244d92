//! Command output: format selection and human progress notices.

use rp_bundle::events::event_names;
use rp_bundle::{ProgressEmitter, ProgressEvent};
use std::io::Write;
use std::sync::Mutex;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress notices as plain lines.
    #[default]
    Human,
    /// JSON report on stdout, JSONL progress events on stderr.
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Render a progress event as a console notice.
///
/// Returns `None` for events that have no human rendering.
pub fn format_notice(event: &ProgressEvent) -> Option<String> {
    match event.event.as_str() {
        event_names::BUILD_STARTED => Some("[build start]".to_string()),
        event_names::IMPORTING => Some(". importing".to_string()),
        event_names::BUILDING => Some(". building".to_string()),
        event_names::ITEM_ADDED => event
            .detail_str("item")
            .map(|item| format!(". add item '{}'", item)),
        event_names::BUILD_FINISHED => Some(format!(
            "[build finished: output in {}]",
            event.detail_str("out_dir").unwrap_or("?")
        )),
        event_names::BUILD_ABORTED => Some(match event.detail_str("path") {
            Some(path) => format!("[error: file '{}' not found, release aborted.]", path),
            None => format!(
                "[error: {}, release aborted.]",
                event.detail_str("reason").unwrap_or("unknown failure")
            ),
        }),
        _ => None,
    }
}

/// Writes human progress notices, one per line.
pub struct ConsoleEmitter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> ConsoleEmitter<W> {
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

impl ConsoleEmitter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ProgressEmitter for ConsoleEmitter<W> {
    fn emit(&self, event: ProgressEvent) {
        let Some(line) = format_notice(&event) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}
