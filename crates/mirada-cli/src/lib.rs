//! Mirador CLI Library
//!
//! Command-line front end for the Mirada visual regression library:
//!
//! - `mirador compare` diffs two images with the same metric the engine uses
//! - `mirador run` checks a directory of saved screenshots against the
//!   reference set and writes the HTML failure report
//! - `mirador config` prints (and optionally validates) the effective config

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod capture;
mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use capture::{parse_viewport, DirectoryDriver};
pub use commands::{
    Cli, ColorArg, Commands, CompareArgs, ConfigArgs, FormatArg, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use handlers::{apply_overrides, execute_compare, execute_config, execute_run, CompareOutput};
pub use logging::init_tracing;
pub use output::ProgressReporter;
