//! Run command handler

use crate::capture::{parse_viewport, DirectoryDriver};
use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::config::load_config;
use crate::output::ProgressReporter;
use mirada::{
    window_size_string, CheckRequest, RegressionConfig, RegressionSession, RunContext, Verdict,
};

/// Apply command-line overrides on top of the loaded configuration
#[must_use]
pub fn apply_overrides(mut config: RegressionConfig, args: &RunArgs) -> RegressionConfig {
    if let Some(max) = args.max_difference {
        config.max_difference = max;
    }
    if let Some(fuzz) = args.fuzz {
        config.fuzz_percent = fuzz;
    }
    if args.no_cleanup {
        config.automatic_cleanup = false;
    }
    config
}

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let (regression, found) = load_config(&args.config)?;
    if !found {
        return Err(CliError::config(format!(
            "{} not found",
            args.config.display()
        )));
    }
    let regression = apply_overrides(regression, args);

    let (width, height) = parse_viewport(&args.viewport)?;
    let driver = DirectoryDriver::open(&args.captures)?.with_window_size(width, height);
    let identifiers = driver.identifiers().to_vec();

    let context = match args.epoch {
        Some(epoch) => RunContext::from_config(&regression, epoch)?,
        None => RunContext::now(&regression)?,
    };
    let mut session = RegressionSession::with_context(context, driver)?;

    reporter.header(&format!(
        "Visual checks ({} at {})",
        identifiers.len(),
        window_size_string(width, height)
    ));
    reporter.start_progress(identifiers.len() as u64, "checking");

    let mut scoped_failures = 0;
    for id in &identifiers {
        reporter.set_message(id);
        let mut request = CheckRequest::new(id.as_str()).with_selector(id.as_str());
        if let Some(group) = &args.group {
            request = request.with_group(group.as_str());
        }

        match session.check(&request) {
            Ok(report) => match report.verdict {
                Verdict::Passed => reporter.success(id),
                Verdict::ToleratedWithDiff => reporter.warning(&format!(
                    "{id} differs by {:.2}% (within {:.2}%)",
                    report.normalized_difference.unwrap_or_default(),
                    report.max_difference
                )),
                Verdict::Failed => reporter.failure(&format!(
                    "{id} differs by {:.2}% (max {:.2}%)",
                    report.normalized_difference.unwrap_or_default(),
                    report.max_difference
                )),
                Verdict::Incomplete => reporter.info(&format!(
                    "{id}: new reference image {}",
                    report.reference_path.display()
                )),
            },
            Err(e) if e.is_check_scoped() => {
                scoped_failures += 1;
                reporter.failure(&format!("{id}: {e}"));
            }
            Err(e) => {
                reporter.finish();
                return Err(e.into());
            }
        }
        reporter.increment(1);
    }
    reporter.finish();

    let report_path = session.on_run_end()?;
    let summary = session.summary();
    reporter.summary(&summary);
    if let Some(path) = report_path {
        reporter.info(&format!("report: {}", path.display()));
    }

    let failed = summary.failed + scoped_failures;
    if failed > 0 {
        return Err(CliError::ChecksFailed {
            failed,
            total: summary.total() + scoped_failures,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn write_png(path: &Path, color: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(10, 10, image::Rgba(color));
        std::fs::write(path, mirada::encode_png(&img).unwrap()).unwrap();
    }

    fn setup() -> (tempfile::TempDir, RunArgs) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("captures")).unwrap();
        write_png(&root.join("captures/header.png"), [0, 0, 0, 255]);
        let config = format!(
            "project_root: {}\nreference_image_directory: ref\nfail_image_directory: fail\n",
            root.display()
        );
        std::fs::write(root.join("mirada.yaml"), config).unwrap();

        let args = RunArgs {
            config: root.join("mirada.yaml"),
            captures: root.join("captures"),
            viewport: "800x600".to_string(),
            group: None,
            max_difference: None,
            fuzz: None,
            no_cleanup: false,
            epoch: Some(42),
        };
        (dir, args)
    }

    #[test]
    fn test_apply_overrides() {
        let (_dir, mut args) = setup();
        args.max_difference = Some(5.0);
        args.fuzz = Some(1.0);
        args.no_cleanup = true;
        let config = apply_overrides(RegressionConfig::default(), &args);
        assert!((config.max_difference - 5.0).abs() < f64::EPSILON);
        assert!((config.fuzz_percent - 1.0).abs() < f64::EPSILON);
        assert!(!config.automatic_cleanup);
    }

    #[test]
    fn test_first_run_creates_references() {
        let (dir, args) = setup();
        execute_run(&CliConfig::new(), &args).unwrap();
        assert!(dir.path().join("ref/800x600/Header.png").is_file());
        assert!(dir.path().join("fail/42/index.html").is_file());
    }

    #[test]
    fn test_changed_capture_fails() {
        let (dir, mut args) = setup();
        execute_run(&CliConfig::new(), &args).unwrap();

        write_png(&dir.path().join("captures/header.png"), [255, 255, 255, 255]);
        args.epoch = Some(43);
        let err = execute_run(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::ChecksFailed { failed: 1, total: 1 }));
        assert!(dir.path().join("fail/43/800x600/fail.Header.png").is_file());
    }

    #[test]
    fn test_missing_config_file() {
        let (_dir, mut args) = setup();
        args.config = PathBuf::from("/nonexistent/mirada.yaml");
        let err = execute_run(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_group_segment() {
        let (dir, mut args) = setup();
        args.group = Some("mobile".to_string());
        execute_run(&CliConfig::new(), &args).unwrap();
        assert!(dir.path().join("ref/mobile/800x600/Header.png").is_file());
    }
}
