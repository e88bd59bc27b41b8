use colored::*;
use std::io::{self, Write};

use crate::pipeline::ConversionStats;
use crate::statistics::RunStatistics;
use crate::validator::{ValidationReport, ValidationStatus};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `1234567` as `1,234,567`
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn heading(writer: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(writer, "{}", title.cyan().bold())
}

pub fn write_analysis(writer: &mut impl Write, stats: &RunStatistics, top: usize) -> io::Result<()> {
    writeln!(writer, "{}\n", "=== LOG ANALYSIS REPORT ===".cyan().bold())?;

    writeln!(writer, "Total lines processed: {}", thousands(stats.total_lines))?;
    writeln!(writer, "Valid entries: {}", thousands(stats.valid_entries))?;
    writeln!(writer, "Error count: {}", thousands(stats.error_count).red())?;
    if let Some(rate) = stats.error_rate() {
        writeln!(writer, "Error rate: {:.2}%", rate)?;
    }
    writeln!(writer)?;

    if !stats.levels.is_empty() {
        heading(writer, "LOG LEVELS:")?;
        for (level, count) in stats.levels.most_common(None) {
            writeln!(writer, "  {}: {} ({:.1}%)", level, thousands(count), stats.share(count))?;
        }
        writeln!(writer)?;
    }

    if let (Some(first), Some(last), Some(span)) = (stats.first_timestamp, stats.last_timestamp, stats.duration()) {
        writeln!(writer, "Time range: {} to {}", first.format(TIME_FORMAT), last.format(TIME_FORMAT))?;
        let duration = span
            .to_std()
            .map(|span| humantime::format_duration(span).to_string())
            .unwrap_or_else(|_| span.to_string());
        writeln!(writer, "Duration: {}\n", duration)?;
    }

    if !stats.top_errors.is_empty() {
        heading(writer, "TOP ERRORS:")?;
        for (event, count) in stats.top_errors.most_common(Some(top)) {
            writeln!(writer, "  {}: {}", thousands(count), event)?;
        }
        writeln!(writer)?;
    }

    if !stats.services.is_empty() {
        heading(writer, "SERVICES:")?;
        for (service, count) in stats.services.most_common(None) {
            writeln!(writer, "  {}: {} ({:.1}%)", service, thousands(count), stats.share(count))?;
        }
        writeln!(writer)?;
    }

    if stats.hourly.iter().any(|&count| count > 0) {
        heading(writer, "HOURLY DISTRIBUTION:")?;
        for (hour, &count) in stats.hourly.iter().enumerate().filter(|(_, count)| **count > 0) {
            writeln!(writer, "  {:02}:00: {}", hour, thousands(count))?;
        }
    }

    Ok(())
}

pub fn write_validation(writer: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    writeln!(writer, "{}\n", "=== LOG VALIDATION REPORT ===".cyan().bold())?;

    writeln!(writer, "Total lines processed: {}", thousands(report.total_lines))?;
    writeln!(writer, "Valid JSON entries: {}", thousands(report.valid_json))?;
    writeln!(writer, "Valid schema entries: {}", thousands(report.valid_schema))?;
    if let (Some(json_rate), Some(schema_rate)) = (report.json_valid_rate(), report.schema_valid_rate()) {
        writeln!(writer, "JSON validity rate: {:.2}%", json_rate)?;
        writeln!(writer, "Schema validity rate: {:.2}%", schema_rate)?;
    }
    writeln!(writer, "Errors: {}", thousands(report.error_count))?;
    writeln!(writer, "Warnings: {}\n", thousands(report.warning_count))?;

    if !report.errors.is_empty() {
        heading(writer, "ERRORS:")?;
        for error in &report.errors {
            writeln!(writer, "  {}", error.red())?;
        }
        if report.omitted_errors() > 0 {
            writeln!(writer, "  ... and {} more errors", thousands(report.omitted_errors()))?;
        }
        writeln!(writer)?;
    }

    if !report.warnings.is_empty() {
        heading(writer, "WARNINGS:")?;
        for warning in &report.warnings {
            writeln!(writer, "  {}", warning.yellow())?;
        }
        if report.omitted_warnings() > 0 {
            writeln!(writer, "  ... and {} more warnings", thousands(report.omitted_warnings()))?;
        }
        writeln!(writer)?;
    }

    if !report.error_types.is_empty() {
        heading(writer, "VALIDATION SUMMARY:")?;
        let mut types: Vec<(&String, usize)> = report.error_types.iter().collect();
        types.sort_by(|a, b| a.0.cmp(b.0));
        for (kind, count) in types {
            writeln!(writer, "  {}: {} occurrences", kind, thousands(count))?;
        }
        writeln!(writer)?;
    }

    let verdict = match report.status() {
        ValidationStatus::Passed => "PASSED: All log entries are valid".green().bold(),
        ValidationStatus::PassedWithWarnings => {
            "PASSED WITH WARNINGS: All log entries are structurally valid but have warnings"
                .yellow()
                .bold()
        }
        ValidationStatus::Failed => "FAILED: Log file contains errors".red().bold(),
    };
    writeln!(writer, "{}", verdict)?;
    Ok(())
}

pub fn write_conversion_stats(writer: &mut impl Write, stats: &ConversionStats) -> io::Result<()> {
    heading(writer, "Conversion Statistics:")?;
    writeln!(writer, "  Total lines: {}", thousands(stats.total_lines))?;
    writeln!(writer, "  Converted: {}", thousands(stats.converted).green())?;
    writeln!(writer, "  Errors: {}", thousands(stats.errors).red())?;
    writeln!(writer, "  Skipped: {}", thousands(stats.skipped).yellow())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::StatsAggregator;
    use crate::validator::SchemaValidator;
    use std::io::Cursor;

    fn rendered(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_analysis_report_sections() {
        colored::control::set_override(false);
        let mut aggregator = StatsAggregator::new();
        aggregator.observe_line(r#"{"timestamp":"2024-01-01T10:00:00Z","level":"ERROR","event":"disk full","service":"db"}"#);
        aggregator.observe_line(r#"{"timestamp":"2024-01-01T11:30:00Z","level":"INFO","event":"ok","service":"db"}"#);
        let report = rendered(|out| write_analysis(out, aggregator.statistics(), 10));

        assert!(report.contains("Error rate: 50.00%"));
        assert!(report.contains("  ERROR: 1 (50.0%)"));
        assert!(report.contains("Time range: 2024-01-01 10:00:00 to 2024-01-01 11:30:00"));
        assert!(report.contains("Duration: 1h 30m"));
        assert!(report.contains("  1: disk full"));
        assert!(report.contains("  db: 2 (100.0%)"));
        assert!(report.contains("  10:00: 1"));
    }

    #[test]
    fn test_validation_report_verdict() {
        colored::control::set_override(false);
        let report = SchemaValidator::new()
            .run(Cursor::new("oops\n"))
            .unwrap();
        let text = rendered(|out| write_validation(out, &report));
        assert!(text.contains("  json_syntax_error: 1 occurrences"));
        assert!(text.ends_with("FAILED: Log file contains errors\n"));
    }

    #[test]
    fn test_conversion_stats_block() {
        colored::control::set_override(false);
        let stats = ConversionStats {
            total_lines: 1200,
            converted: 1100,
            skipped: 40,
            errors: 60,
        };
        assert_eq!(
            rendered(|out| write_conversion_stats(out, &stats)),
            "Conversion Statistics:\n  Total lines: 1,200\n  Converted: 1,100\n  Errors: 60\n  Skipped: 40\n"
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let stats = ConversionStats::default();
        let err = write_conversion_stats(&mut Closed, &stats).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
