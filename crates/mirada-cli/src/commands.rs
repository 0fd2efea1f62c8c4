//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mirador: CLI for Mirada - screenshot regression testing
#[derive(Parser, Debug)]
#[command(name = "mirador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two images
    Compare(CompareArgs),

    /// Run regression checks over a directory of captured screenshots
    Run(RunArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the compare command
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Candidate image
    pub candidate: PathBuf,

    /// Reference image
    pub reference: PathBuf,

    /// Fuzz window in percent
    #[arg(long, default_value_t = mirada::DEFAULT_FUZZ_PERCENT)]
    pub fuzz: f64,

    /// Maximum allowed difference in percent
    #[arg(long, default_value_t = mirada::DEFAULT_MAX_DIFFERENCE)]
    pub max_difference: f64,

    /// Write the diff image here when the images differ
    #[arg(long)]
    pub diff: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "mirada.yaml")]
    pub config: PathBuf,

    /// Directory of captured screenshots (`<identifier>.png`)
    #[arg(long)]
    pub captures: PathBuf,

    /// Viewport segment, e.g. 1280x800
    #[arg(long, default_value = "1280x800")]
    pub viewport: String,

    /// Group segment inserted before the viewport
    #[arg(long)]
    pub group: Option<String>,

    /// Override max_difference (percent)
    #[arg(long)]
    pub max_difference: Option<f64>,

    /// Override fuzz_percent
    #[arg(long)]
    pub fuzz: Option<f64>,

    /// Keep previous runs instead of cleaning the fail directory
    #[arg(long)]
    pub no_cleanup: bool,

    /// Run epoch (defaults to the current time)
    #[arg(long)]
    pub epoch: Option<i64>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "mirada.yaml")]
    pub config: PathBuf,

    /// Also validate the configuration
    #[arg(long)]
    pub validate: bool,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
