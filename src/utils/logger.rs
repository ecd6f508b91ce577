//! Leveled log sink
//!
//! Components receive an `Arc<dyn LogSink>` at construction instead of
//! reaching for a global console. The binary wires [`TracingSink`] once in
//! `main`; tests use [`MemorySink`] to inspect what was logged.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity / category of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
    Tool,
    Agent,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Tool => write!(f, "tool"),
            LogLevel::Agent => write!(f, "agent"),
        }
    }
}

/// Lifecycle marker for task-level log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Started,
    Completed,
    Failed,
    Retry,
}

impl TaskEvent {
    pub fn icon(self) -> &'static str {
        match self {
            TaskEvent::Started => "▶",
            TaskEvent::Completed => "✓",
            TaskEvent::Failed => "✗",
            TaskEvent::Retry => "↻",
        }
    }

    fn level(self) -> LogLevel {
        match self {
            TaskEvent::Started => LogLevel::Info,
            TaskEvent::Completed => LogLevel::Success,
            TaskEvent::Failed => LogLevel::Error,
            TaskEvent::Retry => LogLevel::Warning,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TaskEvent::Started => "STARTED",
            TaskEvent::Completed => "COMPLETED",
            TaskEvent::Failed => "FAILED",
            TaskEvent::Retry => "RETRY",
        }
    }
}

/// Purely observational sink for leveled log lines
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    /// Log a task lifecycle event with its status marker
    fn task(&self, task: &str, event: TaskEvent) {
        self.log(
            event.level(),
            &format!("{} {} - {}", event.icon(), task, event.label()),
        );
    }
}

/// Forwards every line to the `tracing` subscriber installed by the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
            LogLevel::Success => info!(kind = "success", "{}", message),
            LogLevel::Tool => info!(kind = "tool", "[TOOL] {}", message),
            LogLevel::Agent => info!(kind = "agent", "[AGENT] {}", message),
        }
    }
}

/// A single captured line
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: LogLevel,
    pub line: String,
}

/// Keeps timestamped lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<LogLine>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Lines logged at `level`, in order
    pub fn at_level(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.level == level)
            .map(|l| l.line)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = match level {
            LogLevel::Tool => format!("[TOOL] [{}] {}", timestamp, message),
            LogLevel::Agent => format!("[AGENT] [{}] {}", timestamp, message),
            _ => format!("[{}] {}", timestamp, message),
        };
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(LogLine { level, line });
        }
    }
}

/// Default sink for components built without an explicit one
pub fn default_sink() -> Arc<dyn LogSink> {
    Arc::new(TracingSink)
}
