//! Mirada: element screenshot regression testing
//!
//! Mirada (Spanish: "gaze") captures an element through a browser driver,
//! compares it with a stored reference image under a fuzz tolerance, and
//! collects every failure of a run into one HTML report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    MIRADA Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Regression │    │ Regression │    │ Image      │            │
//! │   │ Session    │───►│ Engine     │───►│ Comparator │            │
//! │   └─────┬──────┘    └─────┬──────┘    └────────────┘            │
//! │         │                 │                                      │
//! │   ┌─────▼──────┐    ┌─────▼──────┐    ┌────────────┐            │
//! │   │ Visibility │    │ Path       │    │ Report     │            │
//! │   │ Controller │    │ Resolver   │    │ Aggregator │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mirada::prelude::*;
//!
//! # fn run(driver: MockDriver) -> MiradaResult<()> {
//! let config = RegressionConfig::new("tests/_data/reference", "tests/_output/regression");
//! let mut session = RegressionSession::on_suite_start(&config, driver)?;
//!
//! session.hide_elements("#clock")?;
//! session.assert_no_difference(&CheckRequest::new("Header").with_selector("#header"))?;
//! session.unhide_elements(None)?;
//!
//! if let Some(report) = session.on_run_end()? {
//!     println!("report: {}", report.display());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod compare;
mod config;
mod context;
mod driver;
mod engine;
mod paths;
mod report;
mod result;
mod session;
mod visibility;

pub use compare::{
    decode_image, encode_png, load_image, normalize_png, Classification, ComparisonResult,
    ImageComparator,
};
pub use config::{LatestPointer, RegressionConfig, DEFAULT_FUZZ_PERCENT, DEFAULT_MAX_DIFFERENCE};
pub use context::RunContext;
pub use driver::{
    BoundingBox, BrowserDriver, CaptureTarget, ElementHandle, ElementLocator, MockDriver,
    ScreenshotSaver, ScriptExecutor,
};
pub use engine::{
    locate_single, CaptureMode, CheckReport, CheckRequest, RegressionEngine, Verdict,
    DEFAULT_SELECTOR,
};
pub use paths::{
    ensure_directory_under, normalize_path, resolve_under_root, sanitize_identifier,
    window_size_string, ArtifactKind, ImageRef, PathResolver,
};
pub use report::{
    encode_base64, point_latest, read_latest, FailureRecord, ReportAggregator, Template,
    TemplateSet, TemplateValue, LATEST_POINTER_NAME,
};
pub use result::{MiradaError, MiradaResult};
pub use session::{RegressionSession, RunSummary};
pub use visibility::{visibility_script, ElementVisibilityController, HiddenElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::compare::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::driver::*;
    pub use super::engine::*;
    pub use super::paths::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::session::*;
    pub use super::visibility::*;
}
