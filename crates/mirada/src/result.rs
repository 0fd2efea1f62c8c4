//! Result and error types for Mirada.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Mirada operations
pub type MiradaResult<T> = Result<T, MiradaError>;

/// Errors that can occur in Mirada
#[derive(Debug, Error)]
pub enum MiradaError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Selector matched no element
    #[error("No element found for selector \"{selector}\"")]
    ElementNotFound {
        /// Selector that was queried
        selector: String,
    },

    /// Selector matched more than one element
    #[error("Multiple elements ({count}) found for selector \"{selector}\" but need exactly one element")]
    AmbiguousSelector {
        /// Selector that was queried
        selector: String,
        /// Number of matched elements
        count: usize,
    },

    /// Image could not be decoded
    #[error("Failed to decode image {source_name}: {message}")]
    ImageDecode {
        /// File path, or a label for in-memory data
        source_name: String,
        /// Error message
        message: String,
    },

    /// Image could not be encoded
    #[error("Failed to encode image: {message}")]
    ImageEncode {
        /// Error message
        message: String,
    },

    /// Path resolves outside of the project root
    #[error("Path \"{}\" is outside of the project root \"{}\"", path.display(), root.display())]
    PathEscapesRoot {
        /// Offending path
        path: PathBuf,
        /// Configured project root
        root: PathBuf,
    },

    /// Candidate does not match the reference image
    #[error(
        "Reference image {} is different from current image {} (difference {difference:.2}%, max {max_difference:.2}%)",
        reference.display(),
        fail.display()
    )]
    VisualMismatch {
        /// Reference image path
        reference: PathBuf,
        /// Fail image path
        fail: PathBuf,
        /// Normalized difference in percent
        difference: f64,
        /// Allowed difference in percent
        max_difference: f64,
    },

    /// Browser driver capability failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Writing an artifact failed
    #[error("Failed to write artifact {}: {source}", path.display())]
    Artifact {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Report template is missing or unreadable
    #[error("Template error: {message}")]
    Template {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl MiradaError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the artifact path it was writing
    #[must_use]
    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only affects the current check (the suite may go on)
    #[must_use]
    pub const fn is_check_scoped(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::AmbiguousSelector { .. }
                | Self::ImageDecode { .. }
                | Self::VisualMismatch { .. }
        )
    }
}
