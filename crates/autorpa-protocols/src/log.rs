//! Execution log sinks.
//!
//! Steps report progress through a [`LogSink`] supplied by the caller.
//! [`TracingLogSink`] forwards to `tracing`; [`MemoryLogSink`] keeps a
//! bounded history for display and tests.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    /// A step finished successfully.
    Success,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer of per-step log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, detail: Option<serde_json::Value>);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    fn success(&self, message: &str) {
        self.log(LogLevel::Success, message, None);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }
}

/// Forwards log lines to `tracing` under the `autorpa::exec` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, message: &str, detail: Option<serde_json::Value>) {
        let detail = detail.map(|d| d.to_string()).unwrap_or_default();
        match level {
            LogLevel::Debug => tracing::debug!(target: "autorpa::exec", detail = %detail, "{}", message),
            LogLevel::Info => tracing::info!(target: "autorpa::exec", detail = %detail, "{}", message),
            LogLevel::Success => {
                tracing::info!(target: "autorpa::exec", success = true, detail = %detail, "{}", message)
            }
            LogLevel::Warn => tracing::warn!(target: "autorpa::exec", detail = %detail, "{}", message),
            LogLevel::Error => tracing::error!(target: "autorpa::exec", detail = %detail, "{}", message),
        }
    }
}

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Bounded in-memory log. Oldest entries are dropped first.
pub struct MemoryLogSink {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    min_level: LogLevel,
}

impl MemoryLogSink {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
            min_level: LogLevel::Debug,
        }
    }

    /// Drop entries below `level`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Whether any entry at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }
}

impl Default for MemoryLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, message: &str, detail: Option<serde_json::Value>) {
        if level < self.min_level {
            return;
        }
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_records_entries() {
        let sink = MemoryLogSink::new();
        sink.info("opening browser");
        sink.success("browser opened");
        assert_eq!(sink.len(), 2);
        assert!(sink.contains(LogLevel::Success, "opened"));
        assert_eq!(sink.messages(), vec!["opening browser", "browser opened"]);
    }

    #[test]
    fn test_memory_sink_bounded() {
        let sink = MemoryLogSink::with_capacity(3);
        for i in 0..5 {
            sink.info(&format!("line {i}"));
        }
        assert_eq!(sink.messages(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_memory_sink_min_level() {
        let sink = MemoryLogSink::new().with_min_level(LogLevel::Warn);
        sink.debug("noise");
        sink.info("noise");
        sink.warn("careful");
        sink.error("broken");
        assert_eq!(sink.messages(), vec!["careful", "broken"]);
    }

    #[test]
    fn test_memory_sink_detail() {
        let sink = MemoryLogSink::new();
        sink.log(LogLevel::Error, "failed", Some(json!({"attempt": 3})));
        let entries = sink.entries();
        assert_eq!(entries[0].detail, Some(json!({"attempt": 3})));
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Success);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Success.to_string(), "success");
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingLogSink;
        sink.log(LogLevel::Info, "hello", Some(json!({"k": "v"})));
        sink.success("done");
    }
}
