//! Config command handler

use crate::commands::ConfigArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use mirada::{RegressionConfig, RunContext};
use std::path::Path;

/// Load the regression config, falling back to defaults when `path` is absent
pub fn load_config(path: &Path) -> CliResult<(RegressionConfig, bool)> {
    if path.is_file() {
        Ok((RegressionConfig::from_file(path)?, true))
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok((RegressionConfig::default(), false))
    }
}

/// Execute the config command
pub fn execute_config(config: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let (regression, found) = load_config(&args.config)?;

    if !found {
        reporter.warning(&format!(
            "{} not found, showing defaults",
            args.config.display()
        ));
    }
    print!("{}", serde_yaml_ng::to_string(&regression)?);

    if args.validate {
        // Resolving the run context also checks every directory against the root
        RunContext::from_config(&regression, 0)?;
        reporter.success("configuration is valid");
    }
    Ok(())
}
