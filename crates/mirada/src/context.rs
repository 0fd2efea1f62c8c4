//! Run context: the per-process values every check shares.
//!
//! A [`RunContext`] is built exactly once per run (normally by
//! [`crate::RegressionSession::on_suite_start`]) and then only read. Its
//! `init_epoch` names the failure artifact directory of the run, so every
//! check of the run writes into the same `<fail_dir>/<epoch>/` folder.

use crate::config::{LatestPointer, RegressionConfig};
use crate::paths::{ensure_directory_under, normalize_path, resolve_under_root, PathResolver};
use crate::result::{MiradaError, MiradaResult};
use std::path::{Path, PathBuf};

/// Read-only values shared by all checks of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    init_epoch: i64,
    automatic_cleanup: bool,
    max_difference: f64,
    fuzz_percent: f64,
    project_root: PathBuf,
    reference_image_directory: PathBuf,
    fail_image_directory: PathBuf,
    output_dir: PathBuf,
    template_folder: Option<PathBuf>,
    latest_pointer: LatestPointer,
}

impl RunContext {
    /// Validate `config` and resolve its directories under the project root.
    ///
    /// Has no filesystem side effects; see [`RunContext::prepare`].
    pub fn from_config(config: &RegressionConfig, init_epoch: i64) -> MiradaResult<Self> {
        config.validate()?;

        let project_root = absolute_root(&config.project_root)?;
        let resolve = |dir: &Path| resolve_under_root(&project_root, dir);

        let reference = config
            .reference_image_directory
            .as_deref()
            .ok_or_else(|| MiradaError::configuration("reference_image_directory is missing"))?;
        let fail = config
            .fail_image_directory
            .as_deref()
            .ok_or_else(|| MiradaError::configuration("fail_image_directory is missing"))?;

        let reference_image_directory = resolve(reference)?;
        let fail_image_directory = resolve(fail)?;
        check_fail_directory(&project_root, &reference_image_directory, &fail_image_directory)?;

        Ok(Self {
            init_epoch,
            automatic_cleanup: config.automatic_cleanup,
            max_difference: config.max_difference,
            fuzz_percent: config.fuzz_percent,
            reference_image_directory,
            fail_image_directory,
            output_dir: resolve(&config.output_dir)?,
            template_folder: config.template_folder.clone(),
            latest_pointer: config.latest_pointer,
            project_root,
        })
    }

    /// Build a context stamped with the current time
    pub fn now(config: &RegressionConfig) -> MiradaResult<Self> {
        Self::from_config(config, chrono::Utc::now().timestamp())
    }

    /// Clean up previous runs (when enabled) and create the run directories.
    ///
    /// Cleanup empties the fail image directory before this run's epoch
    /// directory exists, so it never removes artifacts of the current run.
    pub fn prepare(&self) -> MiradaResult<()> {
        if self.automatic_cleanup && self.fail_image_directory.is_dir() {
            tracing::info!(
                dir = %self.fail_image_directory.display(),
                "cleaning up fail image directory"
            );
            empty_directory(&self.fail_image_directory)?;
        }

        let paths = PathResolver::new(self);
        ensure_directory_under(&self.project_root, &paths.temp_directory())?;
        ensure_directory_under(&self.project_root, &self.reference_image_directory)?;
        ensure_directory_under(&self.project_root, &paths.run_directory())?;
        Ok(())
    }

    /// Epoch naming this run's artifact directory
    #[must_use]
    pub const fn init_epoch(&self) -> i64 {
        self.init_epoch
    }

    /// Whether previous fail images are removed at run start
    #[must_use]
    pub const fn automatic_cleanup(&self) -> bool {
        self.automatic_cleanup
    }

    /// Default allowed difference (percent)
    #[must_use]
    pub const fn max_difference(&self) -> f64 {
        self.max_difference
    }

    /// Default fuzz window (percent)
    #[must_use]
    pub const fn fuzz_percent(&self) -> f64 {
        self.fuzz_percent
    }

    /// Absolute, normalized project root
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute reference image directory
    #[must_use]
    pub fn reference_image_directory(&self) -> &Path {
        &self.reference_image_directory
    }

    /// Absolute fail image directory (parent of the run directories)
    #[must_use]
    pub fn fail_image_directory(&self) -> &Path {
        &self.fail_image_directory
    }

    /// Absolute output directory
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Custom report template folder
    #[must_use]
    pub fn template_folder(&self) -> Option<&Path> {
        self.template_folder.as_deref()
    }

    /// How the `latest` pointer is written
    #[must_use]
    pub const fn latest_pointer(&self) -> LatestPointer {
        self.latest_pointer
    }
}

fn absolute_root(root: &Path) -> MiradaResult<PathBuf> {
    if root.is_absolute() {
        return Ok(normalize_path(root));
    }
    let cwd = std::env::current_dir().map_err(|e| {
        MiradaError::configuration(format!("cannot resolve project root {}: {e}", root.display()))
    })?;
    Ok(normalize_path(&cwd.join(root)))
}

/// The fail directory is emptied on cleanup, so it may hold neither the
/// project nor the reference images
fn check_fail_directory(root: &Path, reference: &Path, fail: &Path) -> MiradaResult<()> {
    if fail == root {
        return Err(MiradaError::configuration(format!(
            "fail_image_directory {} must not be the project root",
            fail.display()
        )));
    }
    if reference.starts_with(fail) {
        return Err(MiradaError::configuration(format!(
            "fail_image_directory {} must not contain reference_image_directory {}",
            fail.display(),
            reference.display()
        )));
    }
    Ok(())
}

/// Remove everything inside `dir`, keeping `dir` itself
fn empty_directory(dir: &Path) -> MiradaResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let meta = std::fs::symlink_metadata(&path)?;
        if meta.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
