use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{LognormError, LognormResult};

/// Dialect expected on the input side of a conversion
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// JSON objects as-is, anything else as free text
    #[default]
    Auto,
    /// Structured JSON records only
    Json,
    /// Free text through the generic parser
    Text,
    /// Apache Common Log Format
    Apache,
    /// BSD syslog
    Syslog,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Auto => write!(f, "auto"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Text => write!(f, "text"),
            InputFormat::Apache => write!(f, "apache"),
            InputFormat::Syslog => write!(f, "syslog"),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One canonical JSON record per line
    #[default]
    Json,
    /// One rendered text line per record
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Layout of rendered text lines
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    /// `timestamp - LEVEL - event`
    #[default]
    Simple,
    /// Timestamp, level, tracked metadata, event
    Detailed,
    /// Level wrapped in an ANSI color
    Colored,
}

impl fmt::Display for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextStyle::Simple => write!(f, "simple"),
            TextStyle::Detailed => write!(f, "detailed"),
            TextStyle::Colored => write!(f, "colored"),
        }
    }
}

/// Settings for one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub text_style: TextStyle,

    /// No generic fallback in conversion; warnings fail validation
    pub strict: bool,

    /// Top-level keys merged over the base validation schema
    pub schema_overlay: Option<Map<String, Value>>,

    /// Year for year-less syslog stamps; None means the current year
    pub syslog_year: Option<i32>,

    /// Cap on errors and warnings listed in a validation report
    pub max_reported_issues: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_format: InputFormat::default(),
            output_format: OutputFormat::default(),
            text_style: TextStyle::default(),
            strict: false,
            schema_overlay: None,
            syslog_year: None,
            max_reported_issues: 20,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> LognormResult<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> LognormResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn check(&self) -> LognormResult<()> {
        if let Some(year) = self.syslog_year {
            if !(1..=9999).contains(&year) {
                return Err(LognormError::Configuration {
                    parameter: "syslog_year".to_string(),
                    message: format!("{year} is outside 1..=9999"),
                });
            }
        }
        Ok(())
    }
}
