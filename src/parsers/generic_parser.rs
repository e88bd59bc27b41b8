use chrono::{DateTime, Utc};
use std::ops::Range;

use crate::models::{FormatType, LogRecord};
use crate::parsers::LogParser;
use crate::patterns::{LevelClassifier, TimestampExtractor};

/// Fallback parser for free-form text. Always produces a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericParser {
    extractor: TimestampExtractor,
    classifier: LevelClassifier,
}

impl GenericParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_year(year: Option<i32>) -> Self {
        Self {
            extractor: TimestampExtractor::with_reference_year(year),
            classifier: LevelClassifier::new(),
        }
    }

    /// Parse `line`, stamping it with `fallback_time` when the text carries no timestamp.
    pub fn parse_at(&self, line: &str, fallback_time: Option<DateTime<Utc>>) -> LogRecord {
        let found = self.extractor.extract(line);
        let remainder = match &found {
            Some(found) => remove_span(line, found.span.clone()),
            None => line.to_string(),
        };

        let head = remainder.trim_start_matches(is_separator);
        let body = match self.classifier.leading_marker(head) {
            Some(marker) => strip_field_separator(&head[marker.len..]),
            None => head,
        };
        let level = self.classifier.classify(line);

        LogRecord::new(level, body.trim_end(), line, FormatType::Generic)
            .with_timestamp(found.map(|found| found.instant).or(fallback_time))
    }
}

impl LogParser for GenericParser {
    fn parse(&self, line: &str) -> Option<LogRecord> {
        Some(self.parse_at(line, Some(Utc::now())))
    }

    fn can_parse(&self, _line: &str) -> bool {
        true
    }

    fn format_type(&self) -> FormatType {
        FormatType::Generic
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | ':' | '|')
}

/// Drop the one separator written between the level field and the event.
fn strip_field_separator(body: &str) -> &str {
    if let Some(event) = body.strip_prefix(" - ") {
        return event;
    }
    let body = body.trim_start();
    match body.strip_prefix(['-', ':', '|']) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => body,
    }
}

/// Cut `span` out of `line`, together with brackets directly around it.
fn remove_span(line: &str, span: Range<usize>) -> String {
    let (mut start, mut end) = (span.start, span.end);
    if line[..start].ends_with('[') && line[end..].starts_with(']') {
        start -= 1;
        end += 1;
    }
    format!("{} {}", &line[..start], &line[end..])
}
