use regex::Regex;
use std::sync::LazyLock;

use crate::models::{FormatType, LogLevel, LogRecord};
use crate::parsers::LogParser;
use crate::patterns::{ErrorKeywords, LevelClassifier, TimestampExtractor};

/// Event tag for every syslog line
pub const SYSLOG_EVENT: &str = "syslog_message";

// Mon DD HH:MM:SS hostname process[pid]: message
static SYSLOG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+([^:\[]+)(?:\[(\d+)\])?:\s*(.*)$")
        .expect("syslog pattern")
});

/// BSD syslog parser for lines without a `<PRI>` prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogParser {
    extractor: TimestampExtractor,
    classifier: LevelClassifier,
}

impl SyslogParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `year` for the year-less syslog timestamp instead of the current year
    pub fn with_reference_year(year: Option<i32>) -> Self {
        Self {
            extractor: TimestampExtractor::with_reference_year(year),
            classifier: LevelClassifier::new(),
        }
    }

    fn message_level(&self, message: &str) -> LogLevel {
        self.classifier.detect(message).unwrap_or_else(|| {
            if ErrorKeywords::matches(message) {
                LogLevel::Error
            } else {
                LogLevel::Info
            }
        })
    }
}

impl LogParser for SyslogParser {
    fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = SYSLOG_PATTERN.captures(line)?;
        let message = caps.get(5).map_or("", |m| m.as_str());

        let mut record = LogRecord::new(self.message_level(message), SYSLOG_EVENT, line, FormatType::Syslog)
            .with_timestamp(self.extractor.parse_syslog_brief(&caps[1]));

        record.add_field("hostname", &caps[2]);
        record.add_field("process", caps[3].trim());
        if let Some(pid) = caps.get(4).and_then(|m| m.as_str().parse::<i64>().ok()) {
            record.add_field("pid", pid);
        }
        record.add_field("message", message);

        Some(record)
    }

    fn can_parse(&self, line: &str) -> bool {
        SYSLOG_PATTERN.is_match(line)
    }

    fn format_type(&self) -> FormatType {
        FormatType::Syslog
    }
}
