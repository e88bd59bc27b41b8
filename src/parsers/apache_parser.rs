use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::{FormatType, LogLevel, LogRecord};
use crate::parsers::LogParser;
use crate::patterns::parse_common_log;

/// Event tag for every Common Log Format line
pub const HTTP_REQUEST_EVENT: &str = "http_request";

// host ident authuser [timestamp] "request" status size
static APACHE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) (\S+) (\S+) \[([^\]]+)\] "([^"]*)" (\d+) (\S+)"#)
        .expect("apache common log pattern")
});

/// Apache Common Log Format parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ApacheParser;

impl ApacheParser {
    pub fn new() -> Self {
        Self
    }
}

impl LogParser for ApacheParser {
    fn parse(&self, line: &str) -> Option<LogRecord> {
        let caps = APACHE_PATTERN.captures(line)?;
        let status_code: u16 = caps[6].parse().ok()?;
        let level = if status_code >= 400 {
            LogLevel::Error
        } else {
            LogLevel::Info
        };

        let mut record = LogRecord::new(level, HTTP_REQUEST_EVENT, line, FormatType::Apache)
            .with_timestamp(parse_common_log(&caps[4]));

        record.add_field("client_ip", &caps[1]);
        record.add_field("ident", &caps[2]);
        record.add_field("user", &caps[3]);
        record.add_field("request", &caps[5]);
        record.add_field("status_code", status_code);

        // "-" means no body was sent
        let size = match caps[7].parse::<u64>() {
            Ok(bytes) => Value::from(bytes),
            Err(_) => Value::from(&caps[7]),
        };
        record.add_field("size", size);

        Some(record)
    }

    fn can_parse(&self, line: &str) -> bool {
        APACHE_PATTERN.is_match(line)
    }

    fn format_type(&self) -> FormatType {
        FormatType::Apache
    }
}
