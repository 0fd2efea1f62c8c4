//! Offline capture source.
//!
//! [`DirectoryDriver`] serves screenshots that were captured earlier and
//! saved as `<identifier>.png` in one directory. Each file stem acts as both
//! the selector and the element id, so the regression engine can run without
//! a browser.

use crate::error::{CliError, CliResult};
use mirada::{
    CaptureTarget, ElementHandle, ElementLocator, MiradaError, MiradaResult, ScreenshotSaver,
    ScriptExecutor,
};
use std::path::{Path, PathBuf};

/// Screenshots from a directory, one per identifier
#[derive(Debug, Clone)]
pub struct DirectoryDriver {
    root: PathBuf,
    identifiers: Vec<String>,
    window_size: (u32, u32),
}

impl DirectoryDriver {
    /// Index every `*.png` directly inside `root`, sorted by name
    pub fn open(root: impl Into<PathBuf>) -> CliResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CliError::invalid_argument(format!(
                "capture directory {} does not exist",
                root.display()
            )));
        }

        let pattern = root.join("*.png");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| CliError::invalid_argument(format!("bad capture pattern: {e}")))?;

        let mut identifiers: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        identifiers.sort();

        tracing::debug!(dir = %root.display(), count = identifiers.len(), "indexed captures");
        Ok(Self {
            root,
            identifiers,
            window_size: (1280, 800),
        })
    }

    /// Report this window size to the engine
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Identifiers found, sorted
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Directory the captures come from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn capture_path(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{identifier}.png"))
    }
}

impl ElementLocator for DirectoryDriver {
    fn find_elements(&self, selector: &str) -> MiradaResult<Vec<ElementHandle>> {
        Ok(self
            .identifiers
            .iter()
            .filter(|id| id.as_str() == selector)
            .map(|id| ElementHandle::new(id.clone(), "img"))
            .collect())
    }

    fn css_value(&self, _element: &ElementHandle, property: &str) -> MiradaResult<String> {
        Ok(match property {
            "visibility" => "visible".to_string(),
            _ => String::new(),
        })
    }
}

impl ScreenshotSaver for DirectoryDriver {
    fn capture_screenshot(&self, target: CaptureTarget<'_>) -> MiradaResult<Vec<u8>> {
        match target {
            CaptureTarget::Element(element) => {
                let path = self.capture_path(&element.id);
                std::fs::read(&path).map_err(|e| {
                    MiradaError::driver(format!("cannot read capture {}: {e}", path.display()))
                })
            }
            CaptureTarget::Viewport => Err(MiradaError::driver(
                "viewport capture is not available for saved screenshots",
            )),
        }
    }

    fn window_size(&self) -> MiradaResult<(u32, u32)> {
        Ok(self.window_size)
    }
}

impl ScriptExecutor for DirectoryDriver {
    fn execute_script(
        &self,
        _script: &str,
        _args: &[ElementHandle],
    ) -> MiradaResult<serde_json::Value> {
        Err(MiradaError::driver("scripts cannot run against saved screenshots"))
    }
}

/// Parse a `WxH` viewport string
pub fn parse_viewport(viewport: &str) -> CliResult<(u32, u32)> {
    let parse = |s: &str| s.trim().parse::<u32>().ok().filter(|v| *v > 0);
    viewport
        .split_once(['x', 'X'])
        .and_then(|(w, h)| Some((parse(w)?, parse(h)?)))
        .ok_or_else(|| {
            CliError::invalid_argument(format!("viewport must look like 1280x800, got {viewport}"))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn captures() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("header.png"), b"png-bytes").unwrap();
        std::fs::write(dir.path().join("footer.png"), b"other").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        dir
    }

    #[test]
    fn test_open_indexes_png_files() {
        let dir = captures();
        let driver = DirectoryDriver::open(dir.path()).unwrap();
        assert_eq!(driver.identifiers(), ["footer", "header"]);
    }

    #[test]
    fn test_open_missing_directory() {
        let err = DirectoryDriver::open("/nonexistent/captures").unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_find_and_capture() {
        let dir = captures();
        let driver = DirectoryDriver::open(dir.path()).unwrap();
        let elements = driver.find_elements("header").unwrap();
        assert_eq!(elements.len(), 1);
        let bytes = driver
            .capture_screenshot(CaptureTarget::Element(&elements[0]))
            .unwrap();
        assert_eq!(bytes, b"png-bytes");
        assert!(driver.find_elements("missing").unwrap().is_empty());
    }

    #[test]
    fn test_viewport_capture_unsupported() {
        let dir = captures();
        let driver = DirectoryDriver::open(dir.path()).unwrap();
        assert!(driver.capture_screenshot(CaptureTarget::Viewport).is_err());
    }

    #[test]
    fn test_window_size() {
        let dir = captures();
        let driver = DirectoryDriver::open(dir.path()).unwrap().with_window_size(320, 480);
        assert_eq!(driver.window_size().unwrap(), (320, 480));
    }

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1280x800").unwrap(), (1280, 800));
        assert_eq!(parse_viewport("640X480").unwrap(), (640, 480));
        assert!(parse_viewport("1280").is_err());
        assert!(parse_viewport("0x10").is_err());
        assert!(parse_viewport("axb").is_err());
    }
}
