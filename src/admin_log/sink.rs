use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Which of the interceptor's lines an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Request,
    RequestBody,
    ResponseBody,
    SerializationFailure,
}

impl LogKind {
    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Request => "Request",
            LogKind::RequestBody => "Request Body",
            LogKind::ResponseBody => "Response Body",
            LogKind::SerializationFailure => "Serialization Error",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub kind: LogKind,
    pub request_id: String,
    pub text: String,
}

impl LogEntry {
    pub fn info(kind: LogKind, request_id: &str, text: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            kind,
            request_id: request_id.to_string(),
            text: text.into(),
        }
    }

    pub fn error(kind: LogKind, request_id: &str, text: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            kind,
            request_id: request_id.to_string(),
            text: text.into(),
        }
    }
}

/// Destination for interceptor output. Shared by every concurrent request.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

/// Forwards entries to `tracing` under the `admin_log` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => info!(
                target: "admin_log",
                request_id = %entry.request_id,
                kind = %entry.kind,
                "{}: {}",
                entry.kind,
                entry.text
            ),
            LogLevel::Error => error!(
                target: "admin_log",
                request_id = %entry.request_id,
                kind = %entry.kind,
                "{}: {}",
                entry.kind,
                entry.text
            ),
        }
    }
}

/// Keeps every entry in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn of_kind(&self, kind: LogKind) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.kind == kind)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
