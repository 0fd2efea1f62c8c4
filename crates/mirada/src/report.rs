//! Run report: one HTML bundle for every failed or new check.
//!
//! Records are collected in completion order while the run executes. At run
//! end, when anything was collected, the aggregator writes
//! `index.html`, `index.css` and `index.js` into the run directory and
//! repoints `<fail_dir>/latest` at it.

use crate::config::LatestPointer;
use crate::context::RunContext;
use crate::paths::PathResolver;
use crate::result::{MiradaError, MiradaResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the alias pointing at the newest run directory
pub const LATEST_POINTER_NAME: &str = "latest";

/// One entry of the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Raw check identifier
    pub identifier: String,
    /// Viewport size string
    pub viewport_size: String,
    /// Reference image path, relative to the reference directory
    pub reference_image_path: PathBuf,
    /// Candidate image; empty when the check created a new reference
    pub fail_image_base64: String,
    /// Diff image; empty when there is none
    pub diff_image_base64: String,
    /// Reference image
    pub reference_image_base64: String,
}

impl FailureRecord {
    /// Whether this record marks a newly created reference
    #[must_use]
    pub fn is_new_reference(&self) -> bool {
        self.fail_image_base64.is_empty()
    }
}

/// Base64 text of image bytes, as embedded in the report
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// A value substituted into a template
#[derive(Debug, Clone, Copy)]
pub enum TemplateValue<'a> {
    /// Escaped before insertion
    Text(&'a str),
    /// Inserted verbatim (pre-rendered markup)
    Markup(&'a str),
}

/// A text template with `{{name}}` placeholders.
///
/// Unknown placeholders are left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Wrap template source text
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Substitute `vars` into the template
    #[must_use]
    pub fn render(&self, vars: &[(&str, TemplateValue<'_>)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = after_open[..end].trim();
            match vars.iter().find(|(key, _)| *key == name) {
                Some((_, TemplateValue::Text(value))) => out.push_str(&escape_html(value)),
                Some((_, TemplateValue::Markup(value))) => out.push_str(value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// The five files a report is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    page: Template,
    fail_item: Template,
    new_item: Template,
    stylesheet: String,
    script: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    /// Templates compiled into the library
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            page: Template::new(include_str!("../templates/Page.html")),
            fail_item: Template::new(include_str!("../templates/FailItem.html")),
            new_item: Template::new(include_str!("../templates/NewItem.html")),
            stylesheet: include_str!("../templates/index.css").to_string(),
            script: include_str!("../templates/index.js").to_string(),
        }
    }

    /// Load `Page.html`, `FailItem.html`, `NewItem.html`, `index.css` and
    /// `index.js` from `folder`
    pub fn from_folder(folder: &Path) -> MiradaResult<Self> {
        let read = |name: &str| {
            let path = folder.join(name);
            std::fs::read_to_string(&path).map_err(|e| MiradaError::Template {
                message: format!("cannot read template {}: {e}", path.display()),
            })
        };
        Ok(Self {
            page: Template::new(read("Page.html")?),
            fail_item: Template::new(read("FailItem.html")?),
            new_item: Template::new(read("NewItem.html")?),
            stylesheet: read("index.css")?,
            script: read("index.js")?,
        })
    }

    /// Render the item fragment for one record
    #[must_use]
    pub fn render_item(&self, record: &FailureRecord) -> String {
        let template = if record.is_new_reference() {
            &self.new_item
        } else {
            &self.fail_item
        };
        let reference_path = record.reference_image_path.display().to_string();
        template.render(&[
            ("identifier", TemplateValue::Text(&record.identifier)),
            ("viewport_size", TemplateValue::Text(&record.viewport_size)),
            ("reference_image_path", TemplateValue::Text(&reference_path)),
            ("fail_image", TemplateValue::Text(&record.fail_image_base64)),
            ("diff_image", TemplateValue::Text(&record.diff_image_base64)),
            ("reference_image", TemplateValue::Text(&record.reference_image_base64)),
        ])
    }

    /// Render the page around pre-rendered items
    #[must_use]
    pub fn render_page(&self, items: &str, count: usize, epoch: i64) -> String {
        let count = count.to_string();
        let epoch = epoch.to_string();
        self.page.render(&[
            ("items", TemplateValue::Markup(items)),
            ("count", TemplateValue::Text(&count)),
            ("epoch", TemplateValue::Text(&epoch)),
        ])
    }
}

/// Collects failure records and renders the run report
#[derive(Debug)]
pub struct ReportAggregator {
    records: Vec<FailureRecord>,
    paths: PathResolver,
    epoch: i64,
    template_folder: Option<PathBuf>,
    latest_pointer: LatestPointer,
}

impl ReportAggregator {
    /// Create an aggregator for the run described by `context`
    #[must_use]
    pub fn new(context: &RunContext) -> Self {
        Self {
            records: Vec::new(),
            paths: PathResolver::new(context),
            epoch: context.init_epoch(),
            template_folder: context.template_folder().map(Path::to_path_buf),
            latest_pointer: context.latest_pointer(),
        }
    }

    /// Append a record; order of calls is the order in the report
    pub fn on_check_complete(&mut self, record: FailureRecord) {
        tracing::debug!(
            identifier = %record.identifier,
            viewport = %record.viewport_size,
            new_reference = record.is_new_reference(),
            "recorded report item"
        );
        self.records.push(record);
    }

    /// Records collected so far
    #[must_use]
    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the HTML page for the collected records
    pub fn render_html(&self) -> MiradaResult<String> {
        Ok(self.render_with(&self.templates()?))
    }

    /// Write the report bundle and repoint `latest`.
    ///
    /// Returns the path of `index.html`, or `None` when there was nothing to
    /// report.
    pub fn render(&self) -> MiradaResult<Option<PathBuf>> {
        if self.records.is_empty() {
            tracing::debug!("no failures recorded, skipping report");
            return Ok(None);
        }

        let templates = self.templates()?;
        let html = self.render_with(&templates);

        let run_dir = self.paths.ensure_directory(&self.paths.run_directory())?;
        let report_path = run_dir.join("index.html");
        write_artifact(&report_path, html.as_bytes())?;
        write_artifact(&run_dir.join("index.css"), templates.stylesheet.as_bytes())?;
        write_artifact(&run_dir.join("index.js"), templates.script.as_bytes())?;

        let latest = point_latest(self.paths.fail_root(), self.epoch, self.latest_pointer)?;
        tracing::info!(
            report = %latest.join("index.html").display(),
            items = self.records.len(),
            "report has been created"
        );
        Ok(Some(report_path))
    }

    fn render_with(&self, templates: &TemplateSet) -> String {
        let items: String = self
            .records
            .iter()
            .map(|record| templates.render_item(record))
            .collect();
        templates.render_page(&items, self.records.len(), self.epoch)
    }

    fn templates(&self) -> MiradaResult<TemplateSet> {
        match &self.template_folder {
            Some(folder) => TemplateSet::from_folder(&self.paths.project_root().join(folder)),
            None => Ok(TemplateSet::builtin()),
        }
    }
}

fn write_artifact(path: &Path, contents: &[u8]) -> MiradaResult<()> {
    std::fs::write(path, contents).map_err(|e| MiradaError::artifact(path, e))
}

/// Point `<fail_root>/latest` at the directory of `epoch`
pub fn point_latest(fail_root: &Path, epoch: i64, mode: LatestPointer) -> MiradaResult<PathBuf> {
    let link = fail_root.join(LATEST_POINTER_NAME);
    let target = epoch.to_string();
    remove_previous_pointer(&link)?;

    match mode {
        LatestPointer::Symlink => {
            create_dir_symlink(&target, &link).map_err(|e| MiradaError::artifact(&link, e))?;
        }
        LatestPointer::File => write_artifact(&link, target.as_bytes())?,
        LatestPointer::Auto => {
            if let Err(e) = create_dir_symlink(&target, &link) {
                tracing::debug!(error = %e, "symlink unavailable, writing pointer file");
                write_artifact(&link, target.as_bytes())?;
            }
        }
    }
    Ok(link)
}

/// Resolve a `latest` pointer (symlink or pointer file) to its run directory
pub fn read_latest(fail_root: &Path) -> MiradaResult<Option<PathBuf>> {
    let link = fail_root.join(LATEST_POINTER_NAME);
    let Ok(meta) = std::fs::symlink_metadata(&link) else {
        return Ok(None);
    };
    let target = if meta.file_type().is_symlink() {
        std::fs::read_link(&link)?
    } else {
        PathBuf::from(std::fs::read_to_string(&link)?.trim())
    };
    Ok(Some(fail_root.join(target)))
}

fn remove_previous_pointer(link: &Path) -> MiradaResult<()> {
    let Ok(meta) = std::fs::symlink_metadata(link) else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(link)
    } else {
        std::fs::remove_file(link)
    };
    removed.map_err(|e| MiradaError::artifact(link, e))
}

#[cfg(unix)]
fn create_dir_symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_dir_symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_dir_symlink(_target: &str, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
