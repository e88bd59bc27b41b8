//! End-to-end checks across the pipeline, the aggregator and the validator.

use chrono::{TimeZone, Utc};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use serde_json::{json, Value};
use std::io::Cursor;

use crate::*;

fn config(input_format: InputFormat, output_format: OutputFormat) -> EngineConfig {
    EngineConfig {
        input_format,
        output_format,
        syslog_year: Some(2023),
        ..EngineConfig::default()
    }
}

fn json_of(outcome: &LineOutcome) -> Value {
    serde_json::from_str(outcome.output()).unwrap()
}

#[test]
fn test_json_error_record_feeds_statistics() {
    let line = r#"{"timestamp":"2024-01-01T10:00:00","level":"error","event":"disk full"}"#;
    let mut aggregator = StatsAggregator::new();
    aggregator.run(Cursor::new(line)).unwrap();
    let stats = aggregator.finish();

    assert_eq!(stats.levels.get(&LogLevel::Error), 1);
    assert_eq!(stats.error_count, 1);
    assert_eq!(stats.hourly[10], 1);
}

#[test]
fn test_apache_line_through_pipeline() {
    let pipeline = NormalizationPipeline::new(config(InputFormat::Apache, OutputFormat::Json));
    let outcome = pipeline.convert_line(r#"127.0.0.1 - - [10/Oct/2023:13:55:36] "GET /x HTTP/1.1" 500 123"#);
    let value = json_of(&outcome);

    assert_eq!(value["level"], "ERROR");
    assert_eq!(value["event"], "http_request");
    assert_eq!(value["status_code"], 500);
    assert_eq!(value["timestamp"], "2023-10-10T13:55:36Z");
}

#[test]
fn test_syslog_line_through_pipeline() {
    let pipeline = NormalizationPipeline::new(config(InputFormat::Syslog, OutputFormat::Json));
    let value = json_of(&pipeline.convert_line("Oct 10 13:55:36 host proc[123]: connection refused"));

    assert_eq!(value["hostname"], "host");
    assert_eq!(value["process"], "proc");
    assert_eq!(value["pid"], 123);
    assert_eq!(value["level"], "ERROR");
}

#[test]
fn test_plain_text_gets_processing_instant() {
    let now = Utc.with_ymd_and_hms(2031, 7, 8, 9, 10, 11).unwrap();
    let pipeline = NormalizationPipeline::new(config(InputFormat::Auto, OutputFormat::Json));
    let value = json_of(&pipeline.convert_line_at("  cache warmed for tenant 42  ", now));

    assert_eq!(value["timestamp"], "2031-07-08T09:10:11Z");
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["event"], "cache warmed for tenant 42");
}

#[test]
fn test_every_input_line_yields_one_output_line() {
    let input = [
        r#"{"timestamp":"2024-01-01T10:00:00Z","level":"INFO","event":"a"}"#,
        "",
        "{truncated",
        "   ",
        "free text ERROR line",
        r#"[1,2,3]"#,
        r#"{"event":"no timestamp"}"#,
    ]
    .join("\n");

    for output_format in [OutputFormat::Json, OutputFormat::Text] {
        for input_format in [InputFormat::Auto, InputFormat::Json, InputFormat::Syslog] {
            let pipeline = NormalizationPipeline::new(config(input_format, output_format));
            let mut out = Vec::new();
            let stats = pipeline.run(Cursor::new(input.as_bytes()), &mut out).unwrap();

            let text = String::from_utf8(out).unwrap();
            assert_eq!(text.lines().count(), 7, "{input_format} -> {output_format}");
            assert_eq!(text.lines().nth(1), Some(""));
            assert_eq!(stats.total_lines, 5);
            assert_eq!(stats.converted + stats.skipped + stats.errors, 5);
        }
    }
}

#[test]
fn test_simple_text_round_trip() {
    let original = json!({"timestamp": "2024-03-04T05:06:07Z", "level": "CRITICAL", "event": "primary database unreachable"});
    let text = to_text().convert_line(&original.to_string());
    assert_eq!(text.output(), "2024-03-04T05:06:07Z - CRITICAL - primary database unreachable");

    let back = json_of(&to_json().convert_line(text.output()));
    for key in ["timestamp", "level", "event"] {
        assert_eq!(back[key], original[key], "{key}");
    }
}

fn to_text() -> NormalizationPipeline {
    NormalizationPipeline::new(config(InputFormat::Auto, OutputFormat::Text))
}

fn to_json() -> NormalizationPipeline {
    NormalizationPipeline::new(config(InputFormat::Text, OutputFormat::Json))
}

#[quickcheck]
fn prop_simple_text_round_trip(level: LogLevel, event: String) -> TestResult {
    if event.is_empty()
        || event.trim() != event
        || event.contains(char::is_control)
        || LevelClassifier::new().detect(&event).is_some()
        || TimestampExtractor::new().extract(&event).is_some()
    {
        return TestResult::discard();
    }

    let original = json!({"timestamp": "2024-03-04T05:06:07Z", "level": level.as_str(), "event": event});
    let text = to_text().convert_line(&original.to_string());
    let back = json_of(&to_json().convert_line(text.output()));

    TestResult::from_bool(
        ["timestamp", "level", "event"]
            .iter()
            .all(|key| back[*key] == original[*key]),
    )
}

#[test]
fn test_missing_event_is_exactly_one_error() {
    let validator = SchemaValidator::new();
    let result = validator.validate_line(
        1,
        r#"{"timestamp":"2024-01-01T10:00:00Z","level":"INFO","service":"api","logger":"x"}"#,
    );
    assert_eq!(result.errors().count(), 1);
    assert!(result
        .warnings()
        .all(|issue| issue.kind == IssueKind::MissingRecommended));
}

#[test]
fn test_overlay_from_config_drives_validation() {
    let engine = EngineConfig::from_json_str(r#"{"schema_overlay":{"required":["event","request_id"]}}"#).unwrap();
    let validator = SchemaValidator::from_config(&engine).unwrap();
    let report = validator
        .run(Cursor::new(
            "{\"event\":\"a\",\"request_id\":\"r\"}\n{\"event\":\"b\"}\n",
        ))
        .unwrap();

    assert_eq!(report.total_lines, 2);
    assert_eq!(report.valid_schema, 1);
    assert_eq!(report.error_types.get(&"Missing required field".to_string()), 1);
}

#[test]
fn test_unusable_overlay_fails_before_reading() {
    let engine = EngineConfig::from_json_str(r#"{"schema_overlay":{"properties":[]}}"#).unwrap();
    assert!(matches!(
        SchemaValidator::from_config(&engine),
        Err(LognormError::Schema(_))
    ));
}

#[test]
fn test_top_errors_tie_break_is_first_seen() {
    let input = [
        r#"{"level":"ERROR","event":"disk full"}"#,
        r#"{"level":"ERROR","event":"oom killed"}"#,
        r#"{"level":"ERROR","event":"oom killed"}"#,
        r#"{"level":"ERROR","event":"disk full"}"#,
        r#"{"level":"ERROR","event":"tls handshake"}"#,
    ]
    .join("\n");
    let mut aggregator = StatsAggregator::new();
    aggregator.run(Cursor::new(input)).unwrap();
    let stats = aggregator.finish();

    let top: Vec<&str> = stats
        .top_errors
        .most_common(Some(2))
        .into_iter()
        .map(|(event, _)| event.as_str())
        .collect();
    assert_eq!(top, vec!["disk full", "oom killed"]);
}
