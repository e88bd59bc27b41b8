//! Streaming conversion between canonical JSON records and text lines.
//!
//! Every input line yields exactly one output line, in order. A line that
//! cannot be converted is written back unchanged and counted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, InputFormat, OutputFormat};
use crate::error::{LognormResult, RecordError};
use crate::formatter::TextFormatter;
use crate::models::LogRecord;
use crate::parsers::{ApacheParser, GenericParser, JsonParser, LogParser, SyslogParser};

/// Per-run conversion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub total_lines: usize,
    pub converted: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ConversionStats {
    pub fn record(&mut self, outcome: &LineOutcome) {
        self.total_lines += 1;
        match outcome {
            LineOutcome::Converted(_) => self.converted += 1,
            LineOutcome::Skipped(_) => self.skipped += 1,
            LineOutcome::Failed { .. } => self.errors += 1,
        }
    }
}

/// What happened to one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Converted(String),
    /// No structure found under strict parsing; the raw line is forwarded
    Skipped(String),
    /// Conversion failed; the raw line is forwarded
    Failed { line: String, error: RecordError },
}

impl LineOutcome {
    /// The line to write for this outcome
    pub fn output(&self) -> &str {
        match self {
            LineOutcome::Converted(text) | LineOutcome::Skipped(text) => text,
            LineOutcome::Failed { line, .. } => line,
        }
    }
}

/// Parsed text, or the reason no record was produced
enum TextParse {
    Record(LogRecord),
    NoMatch,
}

pub struct NormalizationPipeline {
    config: EngineConfig,
    json: JsonParser,
    generic: GenericParser,
    apache: ApacheParser,
    syslog: SyslogParser,
    formatter: TextFormatter,
}

impl NormalizationPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            json: JsonParser::new(),
            generic: GenericParser::with_reference_year(config.syslog_year),
            apache: ApacheParser::new(),
            syslog: SyslogParser::with_reference_year(config.syslog_year),
            formatter: TextFormatter::new(config.text_style),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn convert_line(&self, line: &str) -> LineOutcome {
        self.convert_line_at(line, Utc::now())
    }

    /// Convert one non-blank line; `now` stands in for missing timestamps
    pub fn convert_line_at(&self, line: &str, now: DateTime<Utc>) -> LineOutcome {
        let result = match self.config.output_format {
            OutputFormat::Json => self.to_json_line(line, now),
            OutputFormat::Text => self.to_text_line(line, now),
        };

        match result {
            Ok(Some(text)) => LineOutcome::Converted(text),
            Ok(None) => LineOutcome::Skipped(line.to_string()),
            Err(error) => LineOutcome::Failed {
                line: line.to_string(),
                error,
            },
        }
    }

    fn to_json_line(&self, line: &str, now: DateTime<Utc>) -> Result<Option<String>, RecordError> {
        let record = match self.config.input_format {
            InputFormat::Json => self.json.decode(line)?,
            InputFormat::Auto if self.json.can_parse(line) => match self.json.decode(line) {
                Ok(record) => record,
                Err(_) => self.generic.parse_at(line, Some(now)),
            },
            _ => match self.parse_text(line, now) {
                TextParse::Record(record) => record,
                TextParse::NoMatch => return Ok(None),
            },
        };

        serde_json::to_string(&record.to_json())
            .map(Some)
            .map_err(|err| RecordError::Serialization {
                message: err.to_string(),
            })
    }

    fn to_text_line(&self, line: &str, now: DateTime<Utc>) -> Result<Option<String>, RecordError> {
        let record = match self.json.decode(line) {
            Ok(record) => record,
            Err(err) if self.config.input_format == InputFormat::Json => return Err(err),
            Err(_) => match self.parse_text(line, now) {
                TextParse::Record(record) => record,
                TextParse::NoMatch => return Ok(None),
            },
        };
        Ok(Some(self.formatter.format_at(&record, now)))
    }

    /// Apply the dialect parser for the input format, then the fallback policy
    fn parse_text(&self, line: &str, now: DateTime<Utc>) -> TextParse {
        let dialect: Option<&dyn LogParser> = match self.config.input_format {
            InputFormat::Apache => Some(&self.apache),
            InputFormat::Syslog => Some(&self.syslog),
            InputFormat::Auto | InputFormat::Json | InputFormat::Text => None,
        };

        match dialect {
            None => TextParse::Record(self.generic.parse_at(line, Some(now))),
            Some(parser) => match parser.parse(line) {
                Some(record) => TextParse::Record(record),
                None if self.config.strict => TextParse::NoMatch,
                None => {
                    debug!(format = ?parser.format_type(), "no dialect match, using generic parser");
                    TextParse::Record(self.generic.parse_at(line, Some(now)))
                }
            },
        }
    }

    /// Stream `reader` into `writer`, one output line per input line.
    ///
    /// Only failures of the streams themselves end the run early.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> LognormResult<ConversionStats> {
        let mut stats = ConversionStats::default();

        for (index, chunk) in reader.split(b'\n').enumerate() {
            let bytes = chunk?;
            let line = decode_line(&bytes);

            if line.trim().is_empty() {
                writeln!(writer, "{}", line)?;
                continue;
            }

            let outcome = self.convert_line(&line);
            match &outcome {
                LineOutcome::Converted(_) => {}
                LineOutcome::Skipped(_) => debug!(line = index + 1, "no structure found, line forwarded"),
                LineOutcome::Failed { error, .. } => {
                    warn!(line = index + 1, kind = error.kind_name(), "{}", error)
                }
            }
            stats.record(&outcome);
            writeln!(writer, "{}", outcome.output())?;
        }

        writer.flush()?;
        info!(
            total = stats.total_lines,
            converted = stats.converted,
            skipped = stats.skipped,
            errors = stats.errors,
            "conversion finished"
        );
        Ok(stats)
    }
}

/// One line without its terminator; invalid UTF-8 is replaced rather than rejected
pub(crate) fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextStyle;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn pipeline(input_format: InputFormat, output_format: OutputFormat, strict: bool) -> NormalizationPipeline {
        NormalizationPipeline::new(EngineConfig {
            input_format,
            output_format,
            strict,
            syslog_year: Some(2023),
            ..EngineConfig::default()
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn run(pipeline: &NormalizationPipeline, input: &str) -> (Vec<String>, ConversionStats) {
        let mut out = Vec::new();
        let stats = pipeline.run(Cursor::new(input), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        (text.lines().map(str::to_string).collect(), stats)
    }

    #[test]
    fn test_auto_takes_json_objects_as_records() {
        let pipeline = pipeline(InputFormat::Auto, OutputFormat::Json, false);
        let outcome = pipeline.convert_line_at(r#"{"level":"warn","event":"slow","service":"api"}"#, now());
        assert_eq!(
            outcome,
            LineOutcome::Converted(r#"{"level":"WARNING","event":"slow","service":"api"}"#.to_string())
        );
    }

    #[test]
    fn test_auto_plain_text_uses_generic() {
        let pipeline = pipeline(InputFormat::Auto, OutputFormat::Json, false);
        let outcome = pipeline.convert_line_at("user clicked the button", now());
        assert_eq!(
            outcome.output(),
            r#"{"timestamp":"2030-01-01T00:00:00Z","level":"INFO","event":"user clicked the button","original_message":"user clicked the button"}"#
        );
    }

    #[test]
    fn test_json_input_rejects_text() {
        let pipeline = pipeline(InputFormat::Json, OutputFormat::Json, false);
        let outcome = pipeline.convert_line_at("not json", now());
        assert!(matches!(
            outcome,
            LineOutcome::Failed { error: RecordError::MalformedInput { .. }, .. }
        ));
        assert_eq!(outcome.output(), "not json");

        let outcome = pipeline.convert_line_at("42", now());
        assert!(matches!(
            outcome,
            LineOutcome::Failed { error: RecordError::NotAnObject { found: "number" }, .. }
        ));
    }

    #[test]
    fn test_dialect_fallback_policy() {
        let lenient = pipeline(InputFormat::Apache, OutputFormat::Json, false);
        let outcome = lenient.convert_line_at("ERROR not an access log", now());
        assert!(matches!(outcome, LineOutcome::Converted(ref text) if text.contains(r#""level":"ERROR""#)));

        let strict = pipeline(InputFormat::Apache, OutputFormat::Json, true);
        let outcome = strict.convert_line_at("ERROR not an access log", now());
        assert_eq!(outcome, LineOutcome::Skipped("ERROR not an access log".to_string()));
    }

    #[test]
    fn test_text_output_from_json_and_text() {
        let pipeline = pipeline(InputFormat::Syslog, OutputFormat::Text, false);
        let outcome = pipeline.convert_line_at(
            r#"{"timestamp":"2024-01-01T10:00:00Z","level":"ERROR","event":"disk full"}"#,
            now(),
        );
        assert_eq!(outcome.output(), "2024-01-01T10:00:00Z - ERROR - disk full");

        let outcome = pipeline.convert_line_at("Oct 10 13:55:36 host proc[123]: connection refused", now());
        assert_eq!(outcome.output(), "2023-10-10T13:55:36Z - ERROR - syslog_message");
    }

    #[test]
    fn test_text_output_json_input_fails_on_text() {
        let pipeline = pipeline(InputFormat::Json, OutputFormat::Text, false);
        assert!(matches!(
            pipeline.convert_line_at("plain", now()),
            LineOutcome::Failed { .. }
        ));
    }

    #[test]
    fn test_run_keeps_line_count_and_order() {
        let pipeline = pipeline(InputFormat::Json, OutputFormat::Text, false);
        let input = concat!(
            r#"{"timestamp":"2024-01-01T10:00:00Z","level":"INFO","event":"one"}"#,
            "\n",
            "broken {\n",
            "\n",
            r#"{"timestamp":"2024-01-01T10:00:01Z","level":"DEBUG","event":"two"}"#,
            "\r\n",
        );
        let (lines, stats) = run(&pipeline, input);

        assert_eq!(
            lines,
            vec![
                "2024-01-01T10:00:00Z - INFO - one",
                "broken {",
                "",
                "2024-01-01T10:00:01Z - DEBUG - two",
            ]
        );
        assert_eq!(
            stats,
            ConversionStats {
                total_lines: 3,
                converted: 2,
                skipped: 0,
                errors: 1,
            }
        );
    }

    #[test]
    fn test_colored_style_reaches_output() {
        let pipeline = NormalizationPipeline::new(EngineConfig {
            output_format: OutputFormat::Text,
            text_style: TextStyle::Colored,
            ..EngineConfig::default()
        });
        let outcome = pipeline.convert_line_at(
            r#"{"timestamp":"2024-01-01T10:00:00Z","level":"CRITICAL","event":"down"}"#,
            now(),
        );
        assert_eq!(outcome.output(), "2024-01-01T10:00:00Z \x1b[35mCRITICAL\x1b[0m down");
    }
}
