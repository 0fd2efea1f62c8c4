//! Mirador: command-line visual regression checks
//!
//! ## Usage
//!
//! ```bash
//! mirador compare shot.png reference.png --diff diff.png
//! mirador run --captures shots/ --viewport 1280x800
//! mirador config --validate
//! ```

use clap::Parser;
use mirador::{
    execute_compare, execute_config, execute_run, init_tracing, Cli, CliConfig, CliResult,
    ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Compare(args) => execute_compare(&config, &args),
        Commands::Run(args) => execute_run(&config, &args),
        Commands::Config(args) => execute_config(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}
