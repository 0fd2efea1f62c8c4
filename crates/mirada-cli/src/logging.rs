//! Tracing subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
#[must_use]
pub fn default_filter(config: &CliConfig) -> String {
    let level = config.verbosity.log_level();
    format!("mirada={level},mirador={level}")
}

/// Install the global subscriber, writing to stderr.
///
/// A second call is a no-op.
pub fn init_tracing(config: &CliConfig) {
    let default = default_filter(config);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color());

    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
