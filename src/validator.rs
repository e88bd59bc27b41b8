//! Two-phase record validation.
//!
//! Phase one checks that a line is JSON at all; phase two checks the decoded
//! value against the schema, the timestamp, the recommended fields and the
//! sensitive-data patterns. Only errors make a line invalid.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::BufRead;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{LognormResult, RecordError};
use crate::patterns::parse_instant;
use crate::pipeline::decode_line;
use crate::schema::{Schema, Violation};
use crate::statistics::FrequencyTable;

/// Fields every record should carry; their absence is a warning
pub const RECOMMENDED_FIELDS: [&str; 6] = [
    "logger",
    "service",
    "request_id",
    "user_id",
    "duration",
    "status_code",
];

static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ["password", "api_key", "token", "secret"]
        .iter()
        .map(|name| {
            let regex = Regex::new(&format!(r#"(?i){name}"?\s*[:=]\s*[^\s]+"#)).expect("sensitive data pattern");
            (regex, *name)
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    JsonSyntax,
    InvalidRecord,
    MissingField,
    InvalidType,
    PatternMismatch,
    NotAllowed,
    TooShort,
    InvalidTimestamp,
    MissingRecommended,
    SensitiveData,
}

impl IssueKind {
    /// Category name used in messages and the error-type histogram
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::JsonSyntax => "json_syntax_error",
            IssueKind::InvalidRecord => "Invalid record",
            IssueKind::MissingField => "Missing required field",
            IssueKind::InvalidType => "Invalid field type",
            IssueKind::PatternMismatch => "Pattern mismatch",
            IssueKind::NotAllowed => "Value not allowed",
            IssueKind::TooShort => "Value too short",
            IssueKind::InvalidTimestamp => "Invalid timestamp format",
            IssueKind::MissingRecommended => "Missing recommended field",
            IssueKind::SensitiveData => "Sensitive data",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::MissingRecommended | IssueKind::SensitiveData => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl From<&Violation> for IssueKind {
    fn from(violation: &Violation) -> Self {
        match violation {
            Violation::WrongRootType { .. } => IssueKind::InvalidRecord,
            Violation::MissingField(_) => IssueKind::MissingField,
            Violation::WrongType { .. } => IssueKind::InvalidType,
            Violation::PatternMismatch { .. } => IssueKind::PatternMismatch,
            Violation::NotAllowed { .. } => IssueKind::NotAllowed,
            Violation::TooShort { .. } => IssueKind::TooShort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    fn new(kind: IssueKind, detail: impl std::fmt::Display) -> Self {
        Self {
            kind,
            message: format!("{}: {}", kind.label(), detail),
        }
    }

    fn syntax(error: &RecordError) -> Self {
        Self {
            kind: IssueKind::JsonSyntax,
            message: error.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

/// Outcome of validating one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub line_number: usize,
    pub syntax_valid: bool,
    pub schema_valid: bool,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }

    /// Valid means no errors; warnings do not count
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Overall verdict of a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

/// Run-level aggregation of [`ValidationResult`]s
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub total_lines: usize,
    pub valid_json: usize,
    pub valid_schema: usize,
    pub error_count: usize,
    pub warning_count: usize,
    /// First errors as `Line N: message`
    pub errors: Vec<String>,
    /// First warnings as `Line N: message`
    pub warnings: Vec<String>,
    /// Occurrences per issue category
    pub error_types: FrequencyTable<String>,
    #[serde(skip)]
    max_reported: usize,
}

impl ValidationReport {
    pub fn new(max_reported: usize) -> Self {
        Self {
            total_lines: 0,
            valid_json: 0,
            valid_schema: 0,
            error_count: 0,
            warning_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            error_types: FrequencyTable::new(),
            max_reported,
        }
    }

    pub fn add(&mut self, result: &ValidationResult) {
        self.total_lines += 1;
        if result.syntax_valid {
            self.valid_json += 1;
        }
        if result.schema_valid {
            self.valid_schema += 1;
        }

        for issue in &result.issues {
            self.error_types.increment(issue.kind.label().to_string());
            let entry = format!("Line {}: {}", result.line_number, issue.message);
            let (count, listed) = match issue.severity() {
                Severity::Error => (&mut self.error_count, &mut self.errors),
                Severity::Warning => (&mut self.warning_count, &mut self.warnings),
            };
            *count += 1;
            if listed.len() < self.max_reported {
                listed.push(entry);
            }
        }
    }

    /// Errors counted but not listed
    pub fn omitted_errors(&self) -> usize {
        self.error_count - self.errors.len()
    }

    pub fn omitted_warnings(&self) -> usize {
        self.warning_count - self.warnings.len()
    }

    pub fn status(&self) -> ValidationStatus {
        match (self.error_count, self.warning_count) {
            (0, 0) => ValidationStatus::Passed,
            (0, _) => ValidationStatus::PassedWithWarnings,
            _ => ValidationStatus::Failed,
        }
    }

    /// Exit-code predicate; strict runs also fail on warnings
    pub fn passed(&self, strict: bool) -> bool {
        self.error_count == 0 && (!strict || self.warning_count == 0)
    }

    fn rate(&self, count: usize) -> Option<f64> {
        (self.total_lines > 0).then(|| count as f64 / self.total_lines as f64 * 100.0)
    }

    pub fn json_valid_rate(&self) -> Option<f64> {
        self.rate(self.valid_json)
    }

    pub fn schema_valid_rate(&self) -> Option<f64> {
        self.rate(self.valid_schema)
    }
}

/// Validates lines against the merged schema
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Schema,
    max_reported: usize,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            schema: Schema::base(),
            max_reported: EngineConfig::default().max_reported_issues,
        }
    }

    /// Merge `overlay` over the base schema; fails before any line is read
    pub fn with_overlay(overlay: &Map<String, Value>) -> LognormResult<Self> {
        Ok(Self {
            schema: Schema::with_overlay(Some(overlay))?,
            ..Self::new()
        })
    }

    pub fn from_config(config: &EngineConfig) -> LognormResult<Self> {
        Ok(Self {
            schema: Schema::with_overlay(config.schema_overlay.as_ref())?,
            max_reported: config.max_reported_issues,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn validate_line(&self, line_number: usize, line: &str) -> ValidationResult {
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => self.validate_value(line_number, &value),
            Err(err) => ValidationResult {
                line_number,
                syntax_valid: false,
                schema_valid: false,
                issues: vec![Issue::syntax(&RecordError::from(err))],
            },
        }
    }

    /// Phase two on an already decoded value
    pub fn validate_value(&self, line_number: usize, value: &Value) -> ValidationResult {
        let mut issues: Vec<Issue> = self
            .schema
            .check(value)
            .iter()
            .map(|violation| Issue::new(IssueKind::from(violation), violation))
            .collect();

        if let Some(object) = value.as_object() {
            if let Some(timestamp) = object.get("timestamp") {
                let parses = timestamp.as_str().and_then(parse_instant).is_some();
                if !parses {
                    issues.push(Issue::new(IssueKind::InvalidTimestamp, timestamp));
                }
            }

            issues.extend(
                RECOMMENDED_FIELDS
                    .iter()
                    .filter(|field| !object.contains_key(**field))
                    .map(|field| Issue::new(IssueKind::MissingRecommended, field)),
            );

            issues.extend(scan_sensitive(value).map(|name| Issue::new(IssueKind::SensitiveData, format!("{name} in log"))));
        }

        let schema_valid = issues.iter().all(|issue| !issue.is_error());
        if !schema_valid {
            debug!(line = line_number, issues = issues.len(), "record failed validation");
        }
        ValidationResult {
            line_number,
            syntax_valid: true,
            schema_valid,
            issues,
        }
    }

    /// Validate every non-blank line of `reader`
    pub fn run<R: BufRead>(&self, reader: R) -> LognormResult<ValidationReport> {
        let mut report = ValidationReport::new(self.max_reported);

        for (index, chunk) in reader.split(b'\n').enumerate() {
            let bytes = chunk?;
            let line = decode_line(&bytes);
            if line.trim().is_empty() {
                continue;
            }
            report.add(&self.validate_line(index + 1, &line));
        }

        info!(
            total = report.total_lines,
            errors = report.error_count,
            warnings = report.warning_count,
            "validation finished"
        );
        Ok(report)
    }
}

/// Names of the sensitive patterns found in the serialized value
fn scan_sensitive(value: &Value) -> impl Iterator<Item = &'static str> {
    let text = value.to_string();
    SENSITIVE_PATTERNS
        .iter()
        .filter(move |(regex, _)| regex.is_match(&text))
        .map(|(_, name)| *name)
}
