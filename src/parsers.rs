use crate::models::{FormatType, LogRecord};

/// Common interface for all line parsers
pub trait LogParser {
    /// Parse one raw line, or None when the dialect's structure does not apply
    fn parse(&self, line: &str) -> Option<LogRecord>;
    fn can_parse(&self, line: &str) -> bool;
    fn format_type(&self) -> FormatType;
}

pub mod apache_parser;
pub mod generic_parser;
pub mod json_parser;
pub mod syslog_parser;

pub use apache_parser::ApacheParser;
pub use generic_parser::GenericParser;
pub use json_parser::JsonParser;
pub use syslog_parser::SyslogParser;
