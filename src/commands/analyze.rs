use std::io::Write;
use tracing::info;

use crate::cli::{AnalyzeArgs, ReportFormat};
use crate::commands::files::{expand_globs, open_input, OutputSink};
use crate::commands::output::write_analysis;
use crate::error::LognormResult;
use crate::statistics::StatsAggregator;

pub fn run_analyze(args: AnalyzeArgs) -> LognormResult<bool> {
    let files = expand_globs(&args.files)?;
    if files.is_empty() {
        eprintln!("No files matched the given patterns");
        return Ok(true);
    }

    let mut aggregator = StatsAggregator::with_source(args.format).with_reference_year(args.syslog_year);
    for path in &files {
        info!(file = %path.display(), "analyzing");
        aggregator.run(open_input(path)?)?;
    }
    let stats = aggregator.finish();

    let mut output = OutputSink::create(args.output.as_deref())?;
    if !output.is_terminal() {
        colored::control::set_override(false);
    }
    match args.report {
        ReportFormat::Text => write_analysis(&mut output, &stats, args.top)?,
        ReportFormat::Json => writeln!(output, "{}", serde_json::to_string_pretty(&stats)?)?,
    }
    output.finish()?;

    if let Some(path) = &args.output {
        println!("Report saved to {}", path.display());
    }
    Ok(true)
}
