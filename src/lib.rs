pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod formatter;
pub mod models;
pub mod parsers;
pub mod patterns;
pub mod pipeline;
pub mod schema;
pub mod statistics;
pub mod validator;

#[cfg(test)]
mod integration_tests;

pub use config::{EngineConfig, InputFormat, OutputFormat, TextStyle};
pub use error::{LognormError, LognormResult, RecordError};
pub use formatter::TextFormatter;
pub use models::*;
pub use parsers::{ApacheParser, GenericParser, JsonParser, LogParser, SyslogParser};
pub use patterns::{ErrorKeywords, LevelClassifier, TimestampExtractor};
pub use pipeline::{ConversionStats, LineOutcome, NormalizationPipeline};
pub use schema::Schema;
pub use statistics::{FrequencyTable, RecordSource, RunStatistics, StatsAggregator};
pub use validator::{Issue, IssueKind, SchemaValidator, Severity, ValidationReport, ValidationResult};
