//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Some checks failed
    #[error("{failed} of {total} visual checks failed")]
    ChecksFailed {
        /// Failed checks
        failed: usize,
        /// All checks
        total: usize,
    },

    /// Images differ beyond tolerance
    #[error("Images differ by {difference:.2}% (max {max_difference:.2}%)")]
    ImagesDiffer {
        /// Normalized difference in percent
        difference: f64,
        /// Allowed difference in percent
        max_difference: f64,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mirada library error
    #[error("Mirada error: {0}")]
    Mirada(#[from] mirada::MiradaError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
