use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{InputFormat, OutputFormat, TextStyle};
use crate::statistics::RecordSource;

#[derive(Parser)]
#[command(name = "lognorm")]
#[command(author, version, about = "Normalize, analyze and validate JSON, Apache, syslog and free-text logs")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert logs between structured JSON and text
    Convert(ConvertArgs),

    /// Compute statistics over log files
    Analyze(AnalyzeArgs),

    /// Validate JSON logs against the record schema
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Input log file (`.gz` is decompressed)
    pub input: PathBuf,

    /// Output file
    pub output: PathBuf,

    /// Dialect of the input lines
    #[arg(long, short = 'i', value_enum)]
    pub input_format: Option<InputFormat>,

    /// Output representation
    #[arg(long, short = 'f', value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Layout of text output
    #[arg(long, short = 't', value_enum)]
    pub text_style: Option<TextStyle>,

    /// Forward lines the dialect parser cannot read instead of falling back
    #[arg(long)]
    pub strict: bool,

    /// Year for syslog timestamps, which carry none
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub syslog_year: Option<i32>,

    /// Engine configuration file (JSON); flags override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Print conversion counters when done
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Log files to analyze (supports glob patterns)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// How lines are read
    #[arg(long, value_enum, default_value = "json")]
    pub format: RecordSource,

    /// Number of top errors to list
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Report layout
    #[arg(long, value_enum, default_value = "text")]
    pub report: ReportFormat,

    /// Year for syslog timestamps in text logs
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
    pub syslog_year: Option<i32>,

    /// Write the report here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Log file to validate
    pub file: PathBuf,

    /// Schema overlay merged over the base record schema (JSON object)
    #[arg(long, short = 's')]
    pub schema: Option<PathBuf>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Number of errors and warnings listed in the report
    #[arg(long)]
    pub max_issues: Option<usize>,

    /// Engine configuration file (JSON); flags override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Report layout
    #[arg(long, value_enum, default_value = "text")]
    pub report: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable report
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}
