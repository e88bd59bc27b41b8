use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::patterns::level::LEVEL_ALIASES;

/// Event used when a line carries no describable text
pub const EVENT_SENTINEL: &str = "log_message";

/// Canonical log levels in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// All levels, lowest priority first
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Look up a whole token against the alias table, case-insensitive.
    ///
    /// `FATAL` is an alias of both ERROR and CRITICAL; priority order resolves it to ERROR.
    pub fn from_alias(token: &str) -> Option<LogLevel> {
        let token = token.trim();
        LEVEL_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| alias.eq_ignore_ascii_case(token)))
            .map(|(level, _)| *level)
    }

    /// ERROR and CRITICAL count as errors for run statistics
    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Critical)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialect a record was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatType {
    Json,
    Apache,
    Syslog,
    Generic,
}

/// Canonical structured record, one per input line
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Absolute instant, or None when the line carried none
    pub timestamp: Option<DateTime<Utc>>,

    /// Normalized level
    pub level: LogLevel,

    /// Semantic description, never empty
    pub event: String,

    /// Open key-value data in source order
    pub metadata: Map<String, Value>,

    /// Raw source text
    pub original_line: String,

    /// Dialect that produced this record
    pub source_format: FormatType,
}

impl LogRecord {
    /// Create a record; an empty or blank event becomes [`EVENT_SENTINEL`]
    pub fn new(
        level: LogLevel,
        event: impl Into<String>,
        original_line: impl Into<String>,
        source_format: FormatType,
    ) -> Self {
        let event = event.into();
        let event = if event.trim().is_empty() {
            EVENT_SENTINEL.to_string()
        } else {
            event
        };

        Self {
            timestamp: None,
            level,
            event,
            metadata: Map::new(),
            original_line: original_line.into(),
            source_format,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a field to the metadata
    pub fn add_field<T: Into<Value>>(&mut self, key: impl Into<String>, value: T) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Scalar rendering of a metadata field; null and missing fields are None
    pub fn field_display(&self, key: &str) -> Option<String> {
        match self.metadata.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(display_value(value)),
        }
    }

    /// Canonical JSON shape: timestamp, level, event, then metadata in source order
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();

        if let Some(ts) = self.timestamp {
            obj.insert("timestamp".to_string(), Value::String(format_timestamp(&ts)));
        }
        obj.insert("level".to_string(), Value::String(self.level.as_str().to_string()));
        obj.insert("event".to_string(), Value::String(self.event.clone()));

        for (key, value) in &self.metadata {
            obj.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if self.source_format == FormatType::Generic {
            obj.entry("original_message".to_string())
                .or_insert_with(|| Value::String(self.original_line.trim().to_string()));
        }

        Value::Object(obj)
    }
}

/// RFC 3339 in UTC with a `Z` suffix and only as many fractional digits as needed
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render a JSON value the way it reads in a text line
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => value.to_string(),
    }
}
