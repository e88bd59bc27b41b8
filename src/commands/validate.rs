use serde_json::Value;
use std::fs;
use std::io::Write;
use tracing::info;

use crate::cli::{ReportFormat, ValidateArgs};
use crate::commands::files::{open_input, OutputSink};
use crate::commands::output::write_validation;
use crate::config::EngineConfig;
use crate::error::{LognormError, LognormResult};
use crate::validator::SchemaValidator;

/// Configuration file first, then the schema file and flags on top
pub fn resolve_config(args: &ValidateArgs) -> LognormResult<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &args.schema {
        match serde_json::from_str::<Value>(&fs::read_to_string(path)?)? {
            Value::Object(overlay) => config.schema_overlay = Some(overlay),
            _ => {
                return Err(LognormError::Schema(format!(
                    "{} must contain a JSON object",
                    path.display()
                )))
            }
        }
    }
    if args.strict {
        config.strict = true;
    }
    if let Some(max_issues) = args.max_issues {
        config.max_reported_issues = max_issues;
    }
    Ok(config)
}

/// Returns whether the file passed
pub fn run_validate(args: ValidateArgs) -> LognormResult<bool> {
    let config = resolve_config(&args)?;
    let validator = SchemaValidator::from_config(&config)?;

    info!(file = %args.file.display(), strict = config.strict, "validating");
    let report = validator.run(open_input(&args.file)?)?;

    let mut output = OutputSink::create(args.output.as_deref())?;
    if !output.is_terminal() {
        colored::control::set_override(false);
    }
    match args.report {
        ReportFormat::Text => write_validation(&mut output, &report)?,
        ReportFormat::Json => writeln!(output, "{}", serde_json::to_string_pretty(&report)?)?,
    }
    output.finish()?;

    if let Some(path) = &args.output {
        println!("Validation report saved to {}", path.display());
    }
    Ok(report.passed(config.strict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn validate_args(args: &[&str]) -> ValidateArgs {
        let argv = ["lognorm", "validate", "app.log"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Validate(args) => args,
            _ => unreachable!(),
        }
    }

    fn write_file(dir: &Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_flags_and_schema_file_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = write_file(
            dir.path(),
            "lognorm.json",
            r#"{"max_reported_issues":5,"schema_overlay":{"required":["event"]}}"#,
        );
        let schema_path = write_file(dir.path(), "schema.json", r#"{"required":["event","request_id"]}"#);

        let config = resolve_config(&validate_args(&[
            "--config",
            &config_path,
            "--schema",
            &schema_path,
            "--max-issues",
            "3",
            "--strict",
        ]))
        .unwrap();

        assert_eq!(config.max_reported_issues, 3);
        assert!(config.strict);
        assert_eq!(
            config.schema_overlay.map(Value::Object),
            Some(json!({"required": ["event", "request_id"]}))
        );
    }

    #[test]
    fn test_config_file_values_survive_without_flags() {
        let dir = TempDir::new().unwrap();
        let config_path = write_file(
            dir.path(),
            "lognorm.json",
            r#"{"strict":true,"max_reported_issues":5,"schema_overlay":{"required":["event"]}}"#,
        );

        let config = resolve_config(&validate_args(&["--config", &config_path])).unwrap();
        assert_eq!(config.max_reported_issues, 5);
        assert!(config.strict);
        assert_eq!(
            config.schema_overlay.map(Value::Object),
            Some(json!({"required": ["event"]}))
        );
    }

    #[test]
    fn test_schema_file_must_hold_an_object() {
        let dir = TempDir::new().unwrap();
        let schema_path = write_file(dir.path(), "schema.json", r#"["event"]"#);

        assert!(matches!(
            resolve_config(&validate_args(&["--schema", &schema_path])),
            Err(LognormError::Schema(message)) if message.contains("must contain a JSON object")
        ));
    }

    #[test]
    fn test_schema_file_must_be_json() {
        let dir = TempDir::new().unwrap();
        let schema_path = write_file(dir.path(), "schema.json", "required: event");

        assert!(matches!(
            resolve_config(&validate_args(&["--schema", &schema_path])),
            Err(LognormError::Json(_))
        ));
    }
}
