//! Host-facing lifecycle of a regression run.
//!
//! A host test runner drives one [`RegressionSession`] per run:
//!
//! ```text
//! on_suite_start ─► (hide_elements | check | unhide_elements)* ─► on_run_end
//! ```
//!
//! The session owns the driver, the [`RunContext`] built at suite start, the
//! engine, the visibility controller and the report aggregator.

use crate::config::RegressionConfig;
use crate::context::RunContext;
use crate::driver::BrowserDriver;
use crate::engine::{CheckReport, CheckRequest, RegressionEngine, Verdict};
use crate::report::{FailureRecord, ReportAggregator};
use crate::result::MiradaResult;
use crate::visibility::ElementVisibilityController;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verdict counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identical to the reference
    pub passed: usize,
    /// Differences within tolerance
    pub tolerated: usize,
    /// Differences beyond tolerance
    pub failed: usize,
    /// New references created
    pub incomplete: usize,
}

impl RunSummary {
    /// Count one verdict
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Passed => self.passed += 1,
            Verdict::ToleratedWithDiff => self.tolerated += 1,
            Verdict::Failed => self.failed += 1,
            Verdict::Incomplete => self.incomplete += 1,
        }
    }

    /// Total number of checks
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.tolerated + self.failed + self.incomplete
    }

    /// Whether no check failed
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// One visual regression run
#[derive(Debug)]
pub struct RegressionSession<D: BrowserDriver> {
    driver: D,
    engine: RegressionEngine,
    visibility: ElementVisibilityController,
    report: ReportAggregator,
    summary: RunSummary,
}

impl<D: BrowserDriver> RegressionSession<D> {
    /// Start a run: stamp the epoch, clean up and create directories
    pub fn on_suite_start(config: &RegressionConfig, driver: D) -> MiradaResult<Self> {
        Self::with_context(RunContext::now(config)?, driver)
    }

    /// Start a run with a prebuilt context
    pub fn with_context(context: RunContext, driver: D) -> MiradaResult<Self> {
        context.prepare()?;
        tracing::info!(
            epoch = context.init_epoch(),
            reference_dir = %context.reference_image_directory().display(),
            "visual regression run started"
        );
        Ok(Self {
            driver,
            report: ReportAggregator::new(&context),
            engine: RegressionEngine::new(context),
            visibility: ElementVisibilityController::new(),
            summary: RunSummary::default(),
        })
    }

    /// Run one check and record its report entry
    pub fn check(&mut self, request: &CheckRequest) -> MiradaResult<CheckReport> {
        let report = self.engine.check(&self.driver, request)?;
        self.summary.record(report.verdict);
        if let Some(record) = &report.failure_record {
            self.on_check_complete(record.clone());
        }
        Ok(report)
    }

    /// Run one check and fail with [`crate::MiradaError::VisualMismatch`]
    /// when the candidate differs beyond tolerance
    pub fn assert_no_difference(&mut self, request: &CheckRequest) -> MiradaResult<CheckReport> {
        let report = self.check(request)?;
        report.assert()?;
        Ok(report)
    }

    /// Add a report entry produced outside [`RegressionSession::check`]
    pub fn on_check_complete(&mut self, record: FailureRecord) {
        self.report.on_check_complete(record);
    }

    /// Hide elements matching `selector` until they are unhidden
    pub fn hide_elements(&mut self, selector: &str) -> MiradaResult<usize> {
        self.visibility.hide(&self.driver, selector)
    }

    /// Restore elements matching `selector`, or every hidden element
    pub fn unhide_elements(&mut self, selector: Option<&str>) -> MiradaResult<usize> {
        self.visibility.unhide(&self.driver, selector)
    }

    /// Finish the run: restore hidden elements and render the report.
    ///
    /// Returns the report path when any check failed or created a reference.
    pub fn on_run_end(&mut self) -> MiradaResult<Option<PathBuf>> {
        let restored = self.visibility.restore_all(&self.driver);
        let report = self.report.render()?;
        restored?;
        tracing::info!(
            passed = self.summary.passed,
            tolerated = self.summary.tolerated,
            failed = self.summary.failed,
            incomplete = self.summary.incomplete,
            "visual regression run finished"
        );
        Ok(report)
    }

    /// Verdict counts so far
    #[must_use]
    pub const fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Run context
    #[must_use]
    pub const fn context(&self) -> &RunContext {
        self.engine.context()
    }

    /// Driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Report aggregator
    #[must_use]
    pub const fn report(&self) -> &ReportAggregator {
        &self.report
    }

    /// Visibility controller
    #[must_use]
    pub const fn visibility(&self) -> &ElementVisibilityController {
        &self.visibility
    }
}
