//! Terminal output and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use mirada::RunSummary;

/// Progress reporter for check execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` checks
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(style("✓").green().bold(), "PASS", message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line(style("✗").red().bold(), "FAIL", message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(style("⚠").yellow().bold(), "WARN", message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(style("ℹ").blue().bold(), "INFO", message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, summary: &RunSummary) {
        if self.quiet && summary.all_passed() {
            return;
        }

        let _ = self.term.write_line("");

        let RunSummary {
            passed,
            tolerated,
            failed,
            incomplete,
        } = *summary;
        let total = summary.total();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let pending_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} checks ({} passed, {} tolerated, {} failed, {} new references)",
                status,
                total,
                passed_style.apply_to(passed),
                pending_style.apply_to(tolerated),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                pending_style.apply_to(incomplete)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} checks ({passed} passed, {tolerated} tolerated, {failed} failed, {incomplete} new references)"
            ));
        }
    }

    fn line(&self, styled: console::StyledObject<&str>, plain: &str, message: &str) {
        let prefix = if self.use_color {
            styled.to_string()
        } else {
            plain.to_string()
        };
        let text = format!("{prefix} {message}");
        match &self.progress_bar {
            Some(pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(&text);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reporter() {
        let reporter = ProgressReporter::new(true, false);
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_default_reporter() {
        let reporter = ProgressReporter::default();
        assert!(reporter.use_color);
    }

    #[test]
    fn test_messages_do_not_panic() {
        let reporter = ProgressReporter::new(false, false);
        reporter.success("Header matches");
        reporter.failure("Footer differs");
        reporter.warning("Sidebar tolerated");
        reporter.info("report written");
        reporter.header("Checks");
    }

    #[test]
    fn test_summary() {
        let reporter = ProgressReporter::new(false, false);
        let summary = RunSummary {
            passed: 3,
            tolerated: 1,
            failed: 1,
            incomplete: 2,
        };
        reporter.summary(&summary);
        reporter.summary(&RunSummary::default());
    }

    #[test]
    fn test_progress_bar() {
        let mut reporter = ProgressReporter::new(false, false);
        reporter.start_progress(2, "checking");
        reporter.increment(1);
        reporter.set_message("Header");
        reporter.success("inside progress");
        reporter.increment(1);
        reporter.finish();
    }

    #[test]
    fn test_quiet_mode_suppresses_progress() {
        let mut reporter = ProgressReporter::new(false, true);
        reporter.start_progress(10, "checking");
        assert!(reporter.progress_bar.is_none());
        reporter.failure("shown");
    }
}
