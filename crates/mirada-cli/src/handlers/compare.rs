//! Compare command handler

use crate::commands::{CompareArgs, FormatArg};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use mirada::{Classification, ComparisonResult, ImageComparator};
use serde::Serialize;
use std::path::PathBuf;

/// Machine-readable comparison outcome
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutput {
    /// Differing pixel count
    pub absolute_difference: f64,
    /// Normalized difference in percent
    pub normalized_difference: f64,
    /// Outcome class
    pub classification: Classification,
    /// Compared canvas width
    pub width: u32,
    /// Compared canvas height
    pub height: u32,
    /// Where the diff image was written
    pub diff: Option<PathBuf>,
}

impl CompareOutput {
    fn new(result: &ComparisonResult, diff: Option<PathBuf>) -> Self {
        Self {
            absolute_difference: result.absolute_difference,
            normalized_difference: result.normalized_difference,
            classification: result.classification,
            width: result.width,
            height: result.height,
            diff,
        }
    }
}

/// Execute the compare command
pub fn execute_compare(config: &CliConfig, args: &CompareArgs) -> CliResult<()> {
    if !(0.0..=100.0).contains(&args.fuzz) {
        return Err(CliError::invalid_argument(format!(
            "--fuzz must be within 0-100, got {}",
            args.fuzz
        )));
    }
    if !args.max_difference.is_finite() || args.max_difference < 0.0 {
        return Err(CliError::invalid_argument(format!(
            "--max-difference must be a non-negative percentage, got {}",
            args.max_difference
        )));
    }

    let comparator = ImageComparator::new(args.fuzz, args.max_difference);
    let result = comparator.compare_files(&args.candidate, &args.reference)?;

    let mut diff_written = None;
    if let (Some(path), Some(png)) = (&args.diff, result.diff_png()?) {
        std::fs::write(path, png)?;
        tracing::info!(path = %path.display(), "wrote diff image");
        diff_written = Some(path.clone());
    }

    let output = CompareOutput::new(&result, diff_written);
    match args.format {
        FormatArg::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        FormatArg::Text => print_text(config, &output),
    }

    if result.classification == Classification::Failing {
        return Err(CliError::ImagesDiffer {
            difference: result.normalized_difference,
            max_difference: args.max_difference,
        });
    }
    Ok(())
}

fn print_text(config: &CliConfig, output: &CompareOutput) {
    println!("Absolute difference: {} pixels", output.absolute_difference);
    println!("Normalized difference: {:.2}%", output.normalized_difference);
    println!("Compared size: {}x{}", output.width, output.height);

    let reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    match output.classification {
        Classification::Identical => reporter.success("images are identical"),
        Classification::WithinTolerance => reporter.warning("images differ within tolerance"),
        Classification::Failing => reporter.failure("images differ beyond tolerance"),
    }
    if let Some(path) = &output.diff {
        reporter.info(&format!("diff image: {}", path.display()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_png(path: &Path, color: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(color));
        std::fs::write(path, mirada::encode_png(&img).unwrap()).unwrap();
    }

    fn args(dir: &Path, diff: bool) -> CompareArgs {
        CompareArgs {
            candidate: dir.join("a.png"),
            reference: dir.join("b.png"),
            fuzz: 0.3,
            max_difference: 1.0,
            diff: diff.then(|| dir.join("diff.png")),
            format: FormatArg::Json,
        }
    }

    #[test]
    fn test_identical_images_succeed() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), [1, 2, 3, 255]);
        write_png(&dir.path().join("b.png"), [1, 2, 3, 255]);
        execute_compare(&CliConfig::new(), &args(dir.path(), true)).unwrap();
        assert!(!dir.path().join("diff.png").exists());
    }

    #[test]
    fn test_different_images_fail_and_write_diff() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), [0, 0, 0, 255]);
        write_png(&dir.path().join("b.png"), [255, 255, 255, 255]);
        let err = execute_compare(&CliConfig::new(), &args(dir.path(), true)).unwrap_err();
        assert!(matches!(err, CliError::ImagesDiffer { .. }));
        assert!(dir.path().join("diff.png").is_file());
    }

    #[test]
    fn test_invalid_fuzz_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), false);
        args.fuzz = -1.0;
        let err = execute_compare(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_missing_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute_compare(&CliConfig::new(), &args(dir.path(), false)).unwrap_err();
        assert!(matches!(
            err,
            CliError::Mirada(mirada::MiradaError::ImageDecode { .. })
        ));
    }
}
