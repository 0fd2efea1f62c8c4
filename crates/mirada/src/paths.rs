//! Deterministic artifact paths.
//!
//! Every image a check touches (reference, fail, diff, temp) is located by
//! [`PathResolver`] from an [`ImageRef`] and the run epoch, so the engine that
//! writes an artifact and the report that embeds it always agree on where it
//! lives.
//!
//! ```text
//! <reference_dir>/[<group>/]<viewport>/<Identifier>.png
//! <fail_dir>/<epoch>/[<group>/]<viewport>/fail.<Identifier>.png
//! <fail_dir>/<epoch>/[<group>/]<viewport>/diff.<Identifier>.png
//! <output_dir>/debug/<viewport>/<Identifier>
//! ```

use crate::context::RunContext;
use crate::result::{MiradaError, MiradaResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Identifies one regression check instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    identifier: String,
    viewport_size: String,
    group: Option<String>,
}

impl ImageRef {
    /// Create a reference for an identifier at a viewport size (e.g. `1280x800`)
    #[must_use]
    pub fn new(identifier: impl Into<String>, viewport_size: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            viewport_size: viewport_size.into(),
            group: None,
        }
    }

    /// Add a group segment (e.g. the test file name) in front of the viewport
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Raw identifier as given by the caller
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Viewport size string
    #[must_use]
    pub fn viewport_size(&self) -> &str {
        &self.viewport_size
    }

    /// Group segment, if any
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Sanitized identifier used in file names
    #[must_use]
    pub fn sanitized_identifier(&self) -> String {
        sanitize_identifier(&self.identifier)
    }

    /// `[<group>/]<viewport>` relative segment
    fn scope(&self) -> PathBuf {
        let mut scope = PathBuf::new();
        if let Some(group) = &self.group {
            scope.push(group);
        }
        scope.push(&self.viewport_size);
        scope
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group}/{}@{}", self.identifier, self.viewport_size),
            None => write!(f, "{}@{}", self.identifier, self.viewport_size),
        }
    }
}

/// Kind of per-run failure artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Byte-exact copy of the captured candidate
    Fail,
    /// Rendered per-pixel difference
    Diff,
}

impl ArtifactKind {
    /// File name prefix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Diff => "diff",
        }
    }
}

fn disallowed_chars() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    DISALLOWED.get_or_init(|| Regex::new(r"[^A-Za-z0-9./_]").expect("static pattern is valid"))
}

/// Turn a raw identifier into a file-name-safe one.
///
/// Strips everything outside `[A-Za-z0-9._/]` (slashes are kept so an
/// identifier can create subfolders), upper-cases the first letter of every
/// word and converts spaces to underscores. The transform is lossy: distinct
/// identifiers can map to the same name.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    let stripped = disallowed_chars().replace_all(raw, "");
    title_case_words(&stripped).replace(' ', "_")
}

fn title_case_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// Format a window size as a viewport segment (`1280x800`)
#[must_use]
pub fn window_size_string(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `root` and require the result to stay under it.
///
/// Relative paths are joined onto the root; absolute paths must already be
/// inside it. Nothing is ever rebased.
pub fn resolve_under_root(root: &Path, path: &Path) -> MiradaResult<PathBuf> {
    let candidate = if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    };
    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(MiradaError::PathEscapesRoot {
            path: candidate,
            root: root.to_path_buf(),
        })
    }
}

/// Computes every artifact path for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    project_root: PathBuf,
    reference_dir: PathBuf,
    fail_root: PathBuf,
    output_dir: PathBuf,
    epoch: i64,
}

impl PathResolver {
    /// Build a resolver from the run context
    #[must_use]
    pub fn new(context: &RunContext) -> Self {
        Self {
            project_root: context.project_root().to_path_buf(),
            reference_dir: context.reference_image_directory().to_path_buf(),
            fail_root: context.fail_image_directory().to_path_buf(),
            output_dir: context.output_dir().to_path_buf(),
            epoch: context.init_epoch(),
        }
    }

    /// Project root all paths are confined to
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Reference image directory
    #[must_use]
    pub fn reference_directory(&self) -> &Path {
        &self.reference_dir
    }

    /// Parent of all run directories (where `latest` lives)
    #[must_use]
    pub fn fail_root(&self) -> &Path {
        &self.fail_root
    }

    /// This run's failure artifact directory
    #[must_use]
    pub fn run_directory(&self) -> PathBuf {
        self.fail_root.join(self.epoch.to_string())
    }

    /// Directory for temp screenshots
    #[must_use]
    pub fn temp_directory(&self) -> PathBuf {
        self.output_dir.join("debug")
    }

    /// Reference image path relative to the reference directory
    #[must_use]
    pub fn reference_image_relative(&self, image: &ImageRef) -> PathBuf {
        image
            .scope()
            .join(format!("{}.png", image.sanitized_identifier()))
    }

    /// `<reference_dir>/[<group>/]<viewport>/<Identifier>.png`
    pub fn reference_image_path(&self, image: &ImageRef) -> MiradaResult<PathBuf> {
        self.confine(&self.reference_dir.join(self.reference_image_relative(image)))
    }

    /// `<fail_dir>/<epoch>/[<group>/]<viewport>/<kind>.<Identifier>.png`
    pub fn fail_image_path(&self, image: &ImageRef, kind: ArtifactKind) -> MiradaResult<PathBuf> {
        let name = format!("{}.{}.png", kind.as_str(), image.sanitized_identifier());
        self.confine(&self.run_directory().join(image.scope()).join(name))
    }

    /// `<output_dir>/debug/<viewport>/<Identifier>`
    pub fn temp_image_path(&self, image: &ImageRef) -> MiradaResult<PathBuf> {
        self.confine(
            &self
                .temp_directory()
                .join(image.viewport_size())
                .join(image.sanitized_identifier()),
        )
    }

    /// Create `path` and any missing ancestors, refusing paths outside the root
    pub fn ensure_directory(&self, path: &Path) -> MiradaResult<PathBuf> {
        ensure_directory_under(&self.project_root, path)
    }

    fn confine(&self, path: &Path) -> MiradaResult<PathBuf> {
        resolve_under_root(&self.project_root, path)
    }
}

/// Create `path` (resolved against `root`) and its ancestors
pub fn ensure_directory_under(root: &Path, path: &Path) -> MiradaResult<PathBuf> {
    let resolved = resolve_under_root(root, path)?;
    if !resolved.is_dir() {
        tracing::debug!(path = %resolved.display(), "directory does not exist, creating it");
        std::fs::create_dir_all(&resolved).map_err(|e| MiradaError::artifact(&resolved, e))?;
    }
    Ok(resolved)
}
