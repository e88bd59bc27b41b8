use clap::Parser;
use lognorm::cli::{Cli, Commands};
use lognorm::commands::{run_analyze, run_convert, run_validate};
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "lognorm=warn",
        1 => "lognorm=info",
        2 => "lognorm=debug",
        _ => "lognorm=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Analyze(args) => run_analyze(args),
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
