//! One regression check, start to finish.
//!
//! ```text
//! AwaitingCapture ──► Captured ──┬─► BootstrappingReference ──► Incomplete
//!                                └─► Comparing ──┬─► Passed
//!                                                ├─► ToleratedWithDiff
//!                                                └─► Failed
//! ```
//!
//! The temp screenshot written in `Captured` is removed when the check ends,
//! whatever the outcome.

use crate::compare::{encode_png, load_image, Classification, ImageComparator};
use crate::context::RunContext;
use crate::driver::{BrowserDriver, CaptureTarget, ElementHandle};
use crate::paths::{window_size_string, ArtifactKind, ImageRef, PathResolver};
use crate::report::{encode_base64, FailureRecord};
use crate::result::{MiradaError, MiradaResult};
use image::DynamicImage;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Selector used when a check names none
pub const DEFAULT_SELECTOR: &str = "body";

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// How the candidate screenshot is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Ask the driver for a screenshot of the element
    #[default]
    Element,
    /// Capture the viewport and crop it to the element's bounding box
    ViewportCrop,
}

/// Parameters of one check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    identifier: String,
    selector: String,
    max_difference: Option<f64>,
    fuzz_percent: Option<f64>,
    group: Option<String>,
    viewport_size: Option<String>,
    capture_mode: CaptureMode,
}

impl CheckRequest {
    /// Check `identifier` against the `body` element
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            selector: DEFAULT_SELECTOR.to_string(),
            max_difference: None,
            fuzz_percent: None,
            group: None,
            viewport_size: None,
            capture_mode: CaptureMode::Element,
        }
    }

    /// Element to capture
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Override the run's maximum difference (percent)
    #[must_use]
    pub const fn with_max_difference(mut self, max_difference: f64) -> Self {
        self.max_difference = Some(max_difference);
        self
    }

    /// Override the run's fuzz window (percent)
    #[must_use]
    pub const fn with_fuzz_percent(mut self, fuzz: f64) -> Self {
        self.fuzz_percent = Some(fuzz);
        self
    }

    /// Group segment for the artifact paths
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Use this viewport segment instead of the driver's window size
    #[must_use]
    pub fn with_viewport_size(mut self, viewport: impl Into<String>) -> Self {
        self.viewport_size = Some(viewport.into());
        self
    }

    /// Set the capture mode
    #[must_use]
    pub const fn with_capture_mode(mut self, mode: CaptureMode) -> Self {
        self.capture_mode = mode;
        self
    }

    /// Raw identifier
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Selector
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

/// Final state of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Candidate matches the reference
    Passed,
    /// Candidate differs but within tolerance; artifacts written
    ToleratedWithDiff,
    /// Candidate differs beyond tolerance
    Failed,
    /// No reference existed; the candidate became the reference
    Incomplete,
}

impl Verdict {
    /// Whether the check counts as passed
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Passed | Self::ToleratedWithDiff)
    }
}

/// Everything a finished check produced
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Which check this was
    pub image: ImageRef,
    /// Outcome
    pub verdict: Verdict,
    /// Absolute reference image path
    pub reference_path: PathBuf,
    /// Fail image, when written
    pub fail_image_path: Option<PathBuf>,
    /// Diff image, when written
    pub diff_image_path: Option<PathBuf>,
    /// Differing pixel count, when compared
    pub absolute_difference: Option<f64>,
    /// Normalized difference in percent, when compared
    pub normalized_difference: Option<f64>,
    /// Allowed difference in effect for this check
    pub max_difference: f64,
    /// Human readable notes, in the order they were made
    pub comments: Vec<String>,
    /// Report entry for failed and incomplete checks
    pub failure_record: Option<FailureRecord>,
}

impl CheckReport {
    /// Turn a failed verdict into a [`MiradaError::VisualMismatch`]
    pub fn assert(&self) -> MiradaResult<()> {
        if self.verdict != Verdict::Failed {
            return Ok(());
        }
        Err(MiradaError::VisualMismatch {
            reference: self.reference_path.clone(),
            fail: self.fail_image_path.clone().unwrap_or_default(),
            difference: self.normalized_difference.unwrap_or_default(),
            max_difference: self.max_difference,
        })
    }
}

/// Runs checks for one run context
#[derive(Debug)]
pub struct RegressionEngine {
    context: RunContext,
    paths: PathResolver,
    seen_names: HashMap<PathBuf, String>,
}

impl RegressionEngine {
    /// Create an engine for `context`
    #[must_use]
    pub fn new(context: RunContext) -> Self {
        let paths = PathResolver::new(&context);
        Self {
            context,
            paths,
            seen_names: HashMap::new(),
        }
    }

    /// Run context in use
    #[must_use]
    pub const fn context(&self) -> &RunContext {
        &self.context
    }

    /// Path resolver in use
    #[must_use]
    pub const fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Capture the element named by `request` and compare it to its reference
    pub fn check<D: BrowserDriver + ?Sized>(
        &mut self,
        driver: &D,
        request: &CheckRequest,
    ) -> MiradaResult<CheckReport> {
        let max_difference = request
            .max_difference
            .unwrap_or_else(|| self.context.max_difference());
        let fuzz_percent = request
            .fuzz_percent
            .unwrap_or_else(|| self.context.fuzz_percent());
        validate_thresholds(max_difference, fuzz_percent)?;

        // AwaitingCapture
        let element = locate_single(driver, &request.selector)?;
        let viewport = match &request.viewport_size {
            Some(viewport) => viewport.clone(),
            None => {
                let (width, height) = driver.window_size()?;
                window_size_string(width, height)
            }
        };
        let mut image = ImageRef::new(&request.identifier, viewport);
        if let Some(group) = &request.group {
            image = image.with_group(group);
        }
        self.note_name(&image);

        let reference_path = self.paths.reference_image_path(&image)?;
        let temp_path = self.paths.temp_image_path(&image)?;

        // Captured
        let (candidate_png, candidate) = capture(driver, &element, request.capture_mode)?;
        if let Some(parent) = temp_path.parent() {
            self.paths.ensure_directory(parent)?;
        }
        std::fs::write(&temp_path, &candidate_png)
            .map_err(|e| MiradaError::artifact(&temp_path, e))?;
        let _temp = TempFile::new(temp_path);

        let mut report = CheckReport {
            image,
            verdict: Verdict::Incomplete,
            reference_path,
            fail_image_path: None,
            diff_image_path: None,
            absolute_difference: None,
            normalized_difference: None,
            max_difference,
            comments: Vec::new(),
            failure_record: None,
        };

        if !report.reference_path.exists() {
            self.bootstrap_reference(&mut report, &candidate_png)?;
            return Ok(report);
        }

        // Comparing
        let reference = load_image(&report.reference_path)?;
        let comparator = ImageComparator::new(fuzz_percent, max_difference);
        let result = comparator.compare(&candidate, &reference);

        report.absolute_difference = Some(result.absolute_difference);
        report.normalized_difference = Some(result.normalized_difference);
        comment(
            &mut report,
            format!(
                "See an absolute difference of {} with a fuzz value of {fuzz_percent}%",
                result.absolute_difference
            ),
        );
        comment(
            &mut report,
            format!(
                "See a mean squared error difference of {:.2}%",
                result.normalized_difference
            ),
        );

        if result.classification == Classification::Identical {
            report.verdict = Verdict::Passed;
            return Ok(report);
        }

        let fail_path = self.paths.fail_image_path(&report.image, ArtifactKind::Fail)?;
        let diff_path = self.paths.fail_image_path(&report.image, ArtifactKind::Diff)?;
        let diff_png = match &result.diff_image {
            Some(diff) => encode_png(diff)?,
            None => Vec::new(),
        };
        self.write_artifact(&fail_path, &candidate_png)?;
        self.write_artifact(&diff_path, &diff_png)?;
        report.fail_image_path = Some(fail_path);
        report.diff_image_path = Some(diff_path);

        if result.classification == Classification::WithinTolerance {
            report.verdict = Verdict::ToleratedWithDiff;
            comment(
                &mut report,
                format!(
                    "Detected difference {:.2}% is lower than max allowed difference of {max_difference:.2}% but absolute difference has been detected",
                    result.normalized_difference
                ),
            );
            return Ok(report);
        }

        report.verdict = Verdict::Failed;
        comment(
            &mut report,
            format!(
                "Detected difference {:.2}% is higher than max allowed difference of {max_difference:.2}%",
                result.normalized_difference
            ),
        );
        let reference_bytes = std::fs::read(&report.reference_path)?;
        report.failure_record = Some(FailureRecord {
            identifier: report.image.identifier().to_string(),
            viewport_size: report.image.viewport_size().to_string(),
            reference_image_path: self.paths.reference_image_relative(&report.image),
            fail_image_base64: encode_base64(&candidate_png),
            diff_image_base64: encode_base64(&diff_png),
            reference_image_base64: encode_base64(&reference_bytes),
        });
        Ok(report)
    }

    fn bootstrap_reference(&self, report: &mut CheckReport, candidate_png: &[u8]) -> MiradaResult<()> {
        let path = report.reference_path.clone();
        if let Some(parent) = path.parent() {
            self.paths.ensure_directory(parent)?;
        }
        // create_new: an existing reference is never replaced
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| MiradaError::artifact(&path, e))?;
        file.write_all(candidate_png)
            .map_err(|e| MiradaError::artifact(&path, e))?;

        report.verdict = Verdict::Incomplete;
        comment(
            report,
            format!("Reference image {} did not exist and has been created", path.display()),
        );
        report.failure_record = Some(FailureRecord {
            identifier: report.image.identifier().to_string(),
            viewport_size: report.image.viewport_size().to_string(),
            reference_image_path: self.paths.reference_image_relative(&report.image),
            fail_image_base64: String::new(),
            diff_image_base64: String::new(),
            reference_image_base64: encode_base64(candidate_png),
        });
        Ok(())
    }

    fn write_artifact(&self, path: &Path, contents: &[u8]) -> MiradaResult<()> {
        if let Some(parent) = path.parent() {
            self.paths.ensure_directory(parent)?;
        }
        std::fs::write(path, contents).map_err(|e| MiradaError::artifact(path, e))
    }

    /// Warn when two raw identifiers share a file name in this run
    fn note_name(&mut self, image: &ImageRef) {
        let key = self.paths.reference_image_relative(image);
        match self.seen_names.get(&key) {
            Some(previous) if previous != image.identifier() => {
                tracing::warn!(
                    identifier = image.identifier(),
                    previous = %previous,
                    file = %key.display(),
                    "identifiers map to the same file name"
                );
            }
            Some(_) => {}
            None => {
                self.seen_names
                    .insert(key, image.identifier().to_string());
            }
        }
    }
}

fn comment(report: &mut CheckReport, message: String) {
    tracing::info!(check = %report.image, "{message}");
    report.comments.push(message);
}

fn validate_thresholds(max_difference: f64, fuzz_percent: f64) -> MiradaResult<()> {
    if !max_difference.is_finite() || max_difference < 0.0 {
        return Err(MiradaError::configuration(format!(
            "max_difference must be a non-negative percentage, got {max_difference}"
        )));
    }
    if !(0.0..=100.0).contains(&fuzz_percent) {
        return Err(MiradaError::configuration(format!(
            "fuzz_percent must be within 0-100, got {fuzz_percent}"
        )));
    }
    Ok(())
}

/// Resolve `selector` to exactly one element
pub fn locate_single<D: BrowserDriver + ?Sized>(
    driver: &D,
    selector: &str,
) -> MiradaResult<ElementHandle> {
    let mut elements = driver.find_elements(selector)?;
    match elements.len() {
        0 => Err(MiradaError::ElementNotFound {
            selector: selector.to_string(),
        }),
        1 => Ok(elements.remove(0)),
        count => Err(MiradaError::AmbiguousSelector {
            selector: selector.to_string(),
            count,
        }),
    }
}

/// Take the screenshot and normalize it to PNG
fn capture<D: BrowserDriver + ?Sized>(
    driver: &D,
    element: &ElementHandle,
    mode: CaptureMode,
) -> MiradaResult<(Vec<u8>, DynamicImage)> {
    let source = format!("screenshot of element {}", element.id);
    match mode {
        CaptureMode::Element => {
            let bytes = driver.capture_screenshot(CaptureTarget::Element(element))?;
            let decoded = crate::compare::decode_image(&bytes, &source)?;
            if bytes.starts_with(&PNG_SIGNATURE) {
                Ok((bytes, decoded))
            } else {
                let rgba = decoded.to_rgba8();
                Ok((encode_png(&rgba)?, DynamicImage::ImageRgba8(rgba)))
            }
        }
        CaptureMode::ViewportCrop => {
            let bounds = element
                .bounding_box
                .filter(|b| !b.is_empty())
                .ok_or_else(|| MiradaError::driver(format!("element {} is not rendered", element.id)))?;
            let bytes = driver.capture_screenshot(CaptureTarget::Viewport)?;
            let viewport = crate::compare::decode_image(&bytes, &source)?;

            // Clip the box to the viewport on all four sides
            let left = bounds.x.max(0.0).round() as u32;
            let top = bounds.y.max(0.0).round() as u32;
            let right = ((bounds.x + bounds.width).max(0.0).round() as u32).min(viewport.width());
            let bottom =
                ((bounds.y + bounds.height).max(0.0).round() as u32).min(viewport.height());
            let width = right.saturating_sub(left);
            let height = bottom.saturating_sub(top);
            if width == 0 || height == 0 {
                return Err(MiradaError::driver(format!(
                    "element {} lies outside the viewport",
                    element.id
                )));
            }
            let cropped = viewport.crop_imm(left, top, width, height).to_rgba8();
            Ok((encode_png(&cropped)?, DynamicImage::ImageRgba8(cropped)))
        }
    }
}

/// Deletes the temp screenshot when dropped
#[derive(Debug)]
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Best effort; a leftover temp file never fails a check
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %self.path.display(), error = %e, "could not remove temp screenshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegressionConfig;
    use crate::driver::{BoundingBox, MockDriver};
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
    }

    fn engine_in(root: &Path) -> RegressionEngine {
        let config = RegressionConfig::new("reference", "fail").with_project_root(root);
        let context = RunContext::from_config(&config, 100).unwrap();
        context.prepare().unwrap();
        RegressionEngine::new(context)
    }

    fn driver_with(selector: &str, shot: Vec<u8>) -> MockDriver {
        MockDriver::new()
            .with_element(selector, ElementHandle::new("e1", "div"))
            .with_screenshot("e1", shot)
    }

    #[test]
    fn test_request_defaults() {
        let request = CheckRequest::new("Header");
        assert_eq!(request.selector(), "body");
        assert_eq!(request.capture_mode, CaptureMode::Element);
    }

    #[test]
    fn test_element_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let err = engine
            .check(&MockDriver::new(), &CheckRequest::new("x").with_selector("#nope"))
            .unwrap_err();
        assert!(matches!(err, MiradaError::ElementNotFound { .. }));
    }

    #[test]
    fn test_ambiguous_selector() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let driver = MockDriver::new()
            .with_element(".card", ElementHandle::new("c1", "div"))
            .with_element(".card", ElementHandle::new("c2", "div"));
        let err = engine
            .check(&driver, &CheckRequest::new("x").with_selector(".card"))
            .unwrap_err();
        assert!(matches!(err, MiradaError::AmbiguousSelector { count: 2, .. }));
    }

    #[test]
    fn test_bootstrap_then_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let shot = png(4, 4, [10, 20, 30, 255]);
        let driver = driver_with("body", shot.clone());

        let first = engine.check(&driver, &CheckRequest::new("Header")).unwrap();
        assert_eq!(first.verdict, Verdict::Incomplete);
        assert_eq!(std::fs::read(&first.reference_path).unwrap(), shot);
        let record = first.failure_record.unwrap();
        assert!(record.is_new_reference());
        assert!(!record.reference_image_base64.is_empty());

        let second = engine.check(&driver, &CheckRequest::new("Header")).unwrap();
        assert_eq!(second.verdict, Verdict::Passed);
        assert!(second.fail_image_path.is_none());
        assert!(second.failure_record.is_none());
        assert!(second.assert().is_ok());
    }

    #[test]
    fn test_temp_file_removed_after_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let driver = driver_with("body", png(2, 2, [0, 0, 0, 255]));
        engine.check(&driver, &CheckRequest::new("Header")).unwrap();
        let temp = engine
            .paths()
            .temp_image_path(&ImageRef::new("Header", "1280x800"))
            .unwrap();
        assert!(!temp.exists());
    }

    #[test]
    fn test_failed_check_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        engine
            .check(&driver_with("body", png(4, 4, [0, 0, 0, 255])), &CheckRequest::new("Header"))
            .unwrap();

        let report = engine
            .check(
                &driver_with("body", png(4, 4, [255, 255, 255, 255])),
                &CheckRequest::new("Header"),
            )
            .unwrap();
        assert_eq!(report.verdict, Verdict::Failed);
        assert!(report.fail_image_path.as_ref().unwrap().is_file());
        assert!(report.diff_image_path.as_ref().unwrap().is_file());
        let record = report.failure_record.as_ref().unwrap();
        assert!(!record.fail_image_base64.is_empty());
        assert!(!record.diff_image_base64.is_empty());

        let err = report.assert().unwrap_err();
        assert!(matches!(err, MiradaError::VisualMismatch { .. }));
        // reference untouched
        let reference = load_image(&report.reference_path).unwrap().to_rgba8();
        assert_eq!(*reference.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_per_check_max_difference_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        engine
            .check(&driver_with("body", png(4, 4, [0, 0, 0, 255])), &CheckRequest::new("Header"))
            .unwrap();

        let report = engine
            .check(
                &driver_with("body", png(4, 4, [255, 255, 255, 255])),
                &CheckRequest::new("Header").with_max_difference(80.0),
            )
            .unwrap();
        assert_eq!(report.verdict, Verdict::ToleratedWithDiff);
        assert!(report.failure_record.is_none());
        assert!(report.fail_image_path.as_ref().unwrap().is_file());
        assert_eq!(report.comments.len(), 3);
        assert!(report.comments[2].contains("lower than max allowed difference of 80.00%"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let err = engine
            .check(
                &driver_with("body", png(1, 1, [0, 0, 0, 255])),
                &CheckRequest::new("x").with_fuzz_percent(150.0),
            )
            .unwrap_err();
        assert!(matches!(err, MiradaError::Configuration { .. }));
    }

    #[test]
    fn test_group_and_viewport_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let report = engine
            .check(
                &driver_with("#nav", png(2, 2, [1, 1, 1, 255])),
                &CheckRequest::new("nav")
                    .with_selector("#nav")
                    .with_group("HomePage")
                    .with_viewport_size("320x480"),
            )
            .unwrap();
        assert!(report.reference_path.ends_with("reference/HomePage/320x480/Nav.png"));
        assert!(report.reference_path.is_file());
    }

    #[test]
    fn test_undecodable_capture() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let err = engine
            .check(&driver_with("body", b"garbage".to_vec()), &CheckRequest::new("x"))
            .unwrap_err();
        assert!(matches!(err, MiradaError::ImageDecode { .. }));
    }

    #[test]
    fn test_viewport_crop_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let mut viewport = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        viewport.put_pixel(3, 4, Rgba([255, 0, 0, 255]));
        let driver = MockDriver::new()
            .with_element(
                "#logo",
                ElementHandle::new("logo", "img")
                    .with_bounding_box(BoundingBox::new(3.0, 4.0, 2.0, 2.0)),
            )
            .with_viewport_screenshot(encode_png(&viewport).unwrap());

        let report = engine
            .check(
                &driver,
                &CheckRequest::new("logo")
                    .with_selector("#logo")
                    .with_capture_mode(CaptureMode::ViewportCrop),
            )
            .unwrap();
        let reference = load_image(&report.reference_path).unwrap().to_rgba8();
        assert_eq!(reference.dimensions(), (2, 2));
        assert_eq!(*reference.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_viewport_crop_clips_offscreen_part() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let mut viewport = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        viewport.put_pixel(3, 0, Rgba([0, 255, 0, 255]));
        let driver = MockDriver::new()
            .with_element(
                "#menu",
                ElementHandle::new("menu", "nav")
                    .with_bounding_box(BoundingBox::new(-5.0, 0.0, 8.0, 2.0)),
            )
            .with_viewport_screenshot(encode_png(&viewport).unwrap());

        let report = engine
            .check(
                &driver,
                &CheckRequest::new("menu")
                    .with_selector("#menu")
                    .with_capture_mode(CaptureMode::ViewportCrop),
            )
            .unwrap();
        let reference = load_image(&report.reference_path).unwrap().to_rgba8();
        // Only the visible 3x2 part, so the pixel right of the element is excluded
        assert_eq!(reference.dimensions(), (3, 2));
    }

    #[test]
    fn test_viewport_crop_fully_offscreen() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let driver = MockDriver::new()
            .with_element(
                "#menu",
                ElementHandle::new("menu", "nav")
                    .with_bounding_box(BoundingBox::new(-10.0, 0.0, 8.0, 2.0)),
            )
            .with_viewport_screenshot(png(20, 20, [0, 0, 0, 255]));
        let err = engine
            .check(
                &driver,
                &CheckRequest::new("menu")
                    .with_selector("#menu")
                    .with_capture_mode(CaptureMode::ViewportCrop),
            )
            .unwrap_err();
        assert!(matches!(err, MiradaError::Driver { .. }));
    }

    #[test]
    fn test_viewport_crop_requires_bounding_box() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let driver = MockDriver::new()
            .with_element("body", ElementHandle::new("b", "body"))
            .with_viewport_screenshot(png(2, 2, [0, 0, 0, 255]));
        let err = engine
            .check(
                &driver,
                &CheckRequest::new("x").with_capture_mode(CaptureMode::ViewportCrop),
            )
            .unwrap_err();
        assert!(matches!(err, MiradaError::Driver { .. }));
    }

    #[test]
    fn test_colliding_identifiers_keep_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path());
        let driver = driver_with("body", png(2, 2, [0, 0, 0, 255]));
        let a = engine.check(&driver, &CheckRequest::new("main-nav")).unwrap();
        let b = engine.check(&driver, &CheckRequest::new("mainnav")).unwrap();
        assert_eq!(a.reference_path, b.reference_path);
        assert_eq!(b.verdict, Verdict::Passed);
    }
}
