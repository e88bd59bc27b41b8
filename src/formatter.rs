use chrono::{DateTime, Utc};

use crate::config::TextStyle;
use crate::models::{format_timestamp, LogLevel, LogRecord};

/// Metadata fields shown by the detailed style, in this order
pub const DETAILED_FIELDS: [&str; 4] = ["service", "logger", "user_id", "request_id"];

pub const COLOR_RESET: &str = "\x1b[0m";

/// ANSI color code for a level token
pub fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "\x1b[36m",
        LogLevel::Info => "\x1b[32m",
        LogLevel::Warning => "\x1b[33m",
        LogLevel::Error => "\x1b[31m",
        LogLevel::Critical => "\x1b[35m",
    }
}

/// Renders canonical records as single text lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter {
    style: TextStyle,
}

impl TextFormatter {
    pub fn new(style: TextStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn format(&self, record: &LogRecord) -> String {
        self.format_at(record, Utc::now())
    }

    /// Render `record`; a record without timestamp shows `now`
    pub fn format_at(&self, record: &LogRecord, now: DateTime<Utc>) -> String {
        let timestamp = format_timestamp(&record.timestamp.unwrap_or(now));

        match self.style {
            TextStyle::Simple => format!("{} - {} - {}", timestamp, record.level, record.event),
            TextStyle::Detailed => {
                let mut parts = vec![timestamp, record.level.to_string()];
                parts.extend(DETAILED_FIELDS.iter().filter_map(|key| {
                    record.field_display(key).map(|value| format!("{key}={value}"))
                }));
                parts.push(record.event.clone());
                parts.join(" ")
            }
            TextStyle::Colored => format!(
                "{} {}{}{} {}",
                timestamp,
                level_color(record.level),
                record.level,
                COLOR_RESET,
                record.event
            ),
        }
    }
}
