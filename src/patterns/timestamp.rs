use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Recognized timestamp layouts, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampLayout {
    /// `2024-01-01T10:00:00`, optional fraction and `Z`/offset suffix
    Iso8601,
    /// `2024-01-01 10:00:00`, optional fraction
    SpaceSeparated,
    /// `01/31/2024 10:00:00`
    UsDate,
    /// `Oct 10 13:55:36`, no year in the text
    SyslogBrief,
}

impl TimestampLayout {
    pub const PRIORITY: [TimestampLayout; 4] = [
        TimestampLayout::Iso8601,
        TimestampLayout::SpaceSeparated,
        TimestampLayout::UsDate,
        TimestampLayout::SyslogBrief,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            TimestampLayout::Iso8601 => {
                r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?"
            }
            TimestampLayout::SpaceSeparated => r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?",
            TimestampLayout::UsDate => r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}",
            TimestampLayout::SyslogBrief => r"\b[A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\b",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimestampLayout::Iso8601 => "ISO-8601",
            TimestampLayout::SpaceSeparated => "space-separated",
            TimestampLayout::UsDate => "US date",
            TimestampLayout::SyslogBrief => "syslog",
        }
    }
}

static TIMESTAMP_TABLE: LazyLock<Vec<(Regex, TimestampLayout)>> = LazyLock::new(|| {
    TimestampLayout::PRIORITY
        .iter()
        .map(|layout| (Regex::new(layout.pattern()).expect("timestamp pattern"), *layout))
        .collect()
});

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a whole string as an absolute instant.
///
/// Accepts RFC 3339, ISO date-times with or without fraction and offset,
/// space-separated date-times and bare ISO dates (midnight). Values without
/// an offset are taken as UTC.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let zulu_as_offset;
    let offset_text = match text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        Some(stripped) => {
            zulu_as_offset = format!("{stripped}+00:00");
            zulu_as_offset.as_str()
        }
        None => text,
    };
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(offset_text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse the bracketed Common Log Format time, `10/Oct/2000:13:55:36 -0700`.
/// The zone suffix is optional; without it the time is taken as UTC.
pub fn parse_common_log(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_str(text, "%d/%b/%Y:%H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%d/%b/%Y:%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// A timestamp found inside a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampMatch {
    pub instant: DateTime<Utc>,
    /// Byte range of the matched text within the line
    pub span: Range<usize>,
    pub layout: TimestampLayout,
}

/// Dialect-aware timestamp recognition over raw text
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampExtractor {
    /// Year assumed for year-less syslog stamps; None means the current year
    reference_year: Option<i32>,
}

impl TimestampExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_year(reference_year: Option<i32>) -> Self {
        Self { reference_year }
    }

    /// First layout, in priority order, whose match is a real instant
    pub fn extract(&self, line: &str) -> Option<TimestampMatch> {
        TIMESTAMP_TABLE.iter().find_map(|(regex, layout)| {
            let found = regex.find(line)?;
            let instant = self.interpret(*layout, found.as_str())?;
            Some(TimestampMatch {
                instant,
                span: found.range(),
                layout: *layout,
            })
        })
    }

    pub fn extract_instant(&self, line: &str) -> Option<DateTime<Utc>> {
        self.extract(line).map(|found| found.instant)
    }

    /// Parse `Mon DD HH:MM:SS` against the reference year
    pub fn parse_syslog_brief(&self, text: &str) -> Option<DateTime<Utc>> {
        let year = self.reference_year.unwrap_or_else(|| Utc::now().year());
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDateTime::parse_from_str(&format!("{year} {normalized}"), "%Y %b %d %H:%M:%S")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    fn interpret(&self, layout: TimestampLayout, text: &str) -> Option<DateTime<Utc>> {
        match layout {
            TimestampLayout::Iso8601 | TimestampLayout::SpaceSeparated => parse_instant(text),
            TimestampLayout::UsDate => NaiveDateTime::parse_from_str(text, "%m/%d/%Y %H:%M:%S")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive)),
            TimestampLayout::SyslogBrief => self.parse_syslog_brief(text),
        }
    }
}
