use std::io::Write;
use tracing::info;

use crate::cli::ConvertArgs;
use crate::commands::files::{open_input, OutputSink};
use crate::commands::output::write_conversion_stats;
use crate::config::EngineConfig;
use crate::error::LognormResult;
use crate::pipeline::NormalizationPipeline;

/// Command-line flags win over the configuration file
pub fn resolve_config(args: &ConvertArgs) -> LognormResult<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(input_format) = args.input_format {
        config.input_format = input_format;
    }
    if let Some(output_format) = args.output_format {
        config.output_format = output_format;
    }
    if let Some(text_style) = args.text_style {
        config.text_style = text_style;
    }
    if args.strict {
        config.strict = true;
    }
    if args.syslog_year.is_some() {
        config.syslog_year = args.syslog_year;
    }
    Ok(config)
}

pub fn run_convert(args: ConvertArgs) -> LognormResult<bool> {
    let config = resolve_config(&args)?;
    info!(
        input_format = %config.input_format,
        output_format = %config.output_format,
        text_style = %config.text_style,
        strict = config.strict,
        "starting conversion"
    );

    let reader = open_input(&args.input)?;
    let mut output = OutputSink::create(Some(&args.output))?;
    let pipeline = NormalizationPipeline::new(config);
    let stats = pipeline.run(reader, &mut output)?;
    output.finish()?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Converted {} to {}", args.input.display(), args.output.display())?;
    if args.stats {
        writeln!(stdout)?;
        write_conversion_stats(&mut stdout, &stats)?;
    }
    Ok(true)
}
