//! Regression configuration.
//!
//! Loaded from YAML (`serde_yaml_ng`) or built in code, then validated once
//! before a run starts.
//!
//! ```yaml
//! reference_image_directory: tests/_data/reference
//! fail_image_directory: tests/_output/regression
//! max_difference: 1.0      # percent
//! fuzz_percent: 0.3
//! automatic_cleanup: true
//! ```

use crate::result::{MiradaError, MiradaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default allowed normalized difference, in percent
pub const DEFAULT_MAX_DIFFERENCE: f64 = 1.0;

/// Default fuzz window, in percent of the channel range
pub const DEFAULT_FUZZ_PERCENT: f64 = 0.3;

/// How the `latest` pointer to the newest run directory is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatestPointer {
    /// Symlink, falling back to a pointer file when symlinks are unavailable
    #[default]
    Auto,
    /// Symlink only
    Symlink,
    /// Plain file containing the run epoch
    File,
}

/// Configuration for a regression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Root every produced path must stay under
    pub project_root: PathBuf,
    /// Output directory (temp screenshots go to `<output_dir>/debug`)
    pub output_dir: PathBuf,
    /// Directory holding reference images (required)
    pub reference_image_directory: Option<PathBuf>,
    /// Directory holding fail/diff images and reports (required)
    pub fail_image_directory: Option<PathBuf>,
    /// Maximum normalized difference in percent (0-100)
    pub max_difference: f64,
    /// Per-pixel fuzz window in percent (0-100)
    pub fuzz_percent: f64,
    /// Empty the fail image directory once when the run starts
    pub automatic_cleanup: bool,
    /// Folder with custom report templates
    pub template_folder: Option<PathBuf>,
    /// How to write the `latest` pointer
    pub latest_pointer: LatestPointer,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            output_dir: PathBuf::from("tests/_output"),
            reference_image_directory: None,
            fail_image_directory: None,
            max_difference: DEFAULT_MAX_DIFFERENCE,
            fuzz_percent: DEFAULT_FUZZ_PERCENT,
            automatic_cleanup: true,
            template_folder: None,
            latest_pointer: LatestPointer::Auto,
        }
    }
}

impl RegressionConfig {
    /// Create a config with both required directories set
    #[must_use]
    pub fn new(reference_dir: impl Into<PathBuf>, fail_dir: impl Into<PathBuf>) -> Self {
        Self {
            reference_image_directory: Some(reference_dir.into()),
            fail_image_directory: Some(fail_dir.into()),
            ..Self::default()
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> MiradaResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> MiradaResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MiradaError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Set the project root
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the maximum difference (percent)
    #[must_use]
    pub const fn with_max_difference(mut self, max_difference: f64) -> Self {
        self.max_difference = max_difference;
        self
    }

    /// Set the fuzz window (percent)
    #[must_use]
    pub const fn with_fuzz_percent(mut self, fuzz: f64) -> Self {
        self.fuzz_percent = fuzz;
        self
    }

    /// Enable or disable automatic cleanup
    #[must_use]
    pub const fn with_automatic_cleanup(mut self, cleanup: bool) -> Self {
        self.automatic_cleanup = cleanup;
        self
    }

    /// Use a custom report template folder
    #[must_use]
    pub fn with_template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }

    /// Set the latest pointer mode
    #[must_use]
    pub const fn with_latest_pointer(mut self, mode: LatestPointer) -> Self {
        self.latest_pointer = mode;
        self
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> MiradaResult<()> {
        require_dir(
            self.reference_image_directory.as_deref(),
            "reference_image_directory",
        )?;
        require_dir(self.fail_image_directory.as_deref(), "fail_image_directory")?;

        if !self.max_difference.is_finite() || self.max_difference < 0.0 {
            return Err(MiradaError::configuration(format!(
                "max_difference must be a non-negative percentage, got {}",
                self.max_difference
            )));
        }
        if !(0.0..=100.0).contains(&self.fuzz_percent) {
            return Err(MiradaError::configuration(format!(
                "fuzz_percent must be within 0-100, got {}",
                self.fuzz_percent
            )));
        }
        if self.project_root.as_os_str().is_empty() {
            return Err(MiradaError::configuration("project_root must not be empty"));
        }
        Ok(())
    }
}

fn require_dir(dir: Option<&Path>, field: &str) -> MiradaResult<()> {
    match dir {
        Some(d) if !d.as_os_str().is_empty() => Ok(()),
        _ => Err(MiradaError::configuration(format!(
            "required field `{field}` is missing"
        ))),
    }
}
