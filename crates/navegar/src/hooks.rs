//! Batch lifecycle orchestration.
//!
//! [`BatchHooks`] is the adapter between the external test runner and the
//! harness: the runner calls `start_batch` once, `after_scenario` after
//! every test with that test's [`TestReport`], and `finish_batch` once at
//! the end. Teardown steps run in a fixed order; best-effort steps report
//! through the [`NotificationSink`] instead of failing the scenario, and
//! everything becomes a no-op when there is no current test. The aggregate
//! pass/fail flag pushed to the remote lab is owned here, batch-scoped.

use crate::config::SuiteConfig;
use crate::display::VirtualDisplay;
use crate::driver::BrowserDriver;
use crate::media::{
    failed_screenshot_name, passed_screenshot_name, ScreenshotContext, ScreenshotWriter,
    VideoCapture, VideoConfig,
};
use crate::notifier::{NotificationSink, TracingNotifier};
use crate::result::{NavegarError, NavegarResult};
use std::sync::Arc;
use tracing::info;

/// Script injected to pause a remote-lab session for debugging
pub const LAB_BREAKPOINT_SCRIPT: &str = "lab: break";

/// Script pushing the aggregate batch result to the remote lab
#[must_use]
pub fn lab_job_result_script(all_passed: bool) -> String {
    format!("lab:job-result={all_passed}")
}

/// Outcome of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Scenario passed
    Passed,
    /// Scenario failed
    Failed,
}

impl TestOutcome {
    /// Whether the scenario failed
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// What the runner tells the hooks about a finished scenario
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Test title
    pub title: String,
    /// Parent suite title
    pub suite: String,
    /// Outcome
    pub outcome: TestOutcome,
}

impl TestReport {
    /// Report for a passed scenario
    #[must_use]
    pub fn passed(suite: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            suite: suite.into(),
            outcome: TestOutcome::Passed,
        }
    }

    /// Report for a failed scenario
    #[must_use]
    pub fn failed(suite: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            suite: suite.into(),
            outcome: TestOutcome::Failed,
        }
    }
}

/// Fail when the browser console collected severe entries
pub async fn check_console_errors(driver: &dyn BrowserDriver) -> NavegarResult<()> {
    let logs = driver.console_logs().await?;
    let severe: Vec<_> = logs.iter().filter(|e| e.level.is_severe()).collect();
    if let Some(first) = severe.first() {
        return Err(NavegarError::ConsoleErrors {
            count: severe.len(),
            sample: first.text.clone(),
        });
    }
    Ok(())
}

/// Batch-scoped lifecycle state and teardown orchestration
pub struct BatchHooks {
    config: SuiteConfig,
    driver: Arc<dyn BrowserDriver>,
    notifier: Arc<dyn NotificationSink>,
    screenshots: ScreenshotWriter,
    video: Option<VideoCapture>,
    display: Option<VirtualDisplay>,
    all_passed: bool,
    started: bool,
}

impl std::fmt::Debug for BatchHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHooks")
            .field("started", &self.started)
            .field("all_passed", &self.all_passed)
            .field("video", &self.video.is_some())
            .field("display", &self.display.is_some())
            .finish()
    }
}

impl BatchHooks {
    /// Create hooks around the injected session
    #[must_use]
    pub fn new(config: SuiteConfig, driver: Arc<dyn BrowserDriver>) -> Self {
        let screenshots = ScreenshotWriter::new(&config.screenshot_dir);
        Self {
            config,
            driver,
            notifier: Arc::new(TracingNotifier),
            screenshots,
            video: None,
            display: None,
            all_passed: true,
            started: false,
        }
    }

    /// Replace the warning sink
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Aggregate pass/fail over the batch so far
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.all_passed
    }

    /// Whether batch setup ran
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the batch video is still recording
    #[must_use]
    pub fn video_recording(&self) -> bool {
        self.video.as_ref().is_some_and(VideoCapture::is_recording)
    }

    /// Batch setup: virtual display first, then video capture.
    ///
    /// Idempotent; a missing display server downgrades to a warning.
    pub async fn start_batch(&mut self) -> NavegarResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        if !self.config.headless {
            match VirtualDisplay::start(self.config.display_number, self.config.screen_size).await {
                Ok(display) => self.display = Some(display),
                Err(e) => self
                    .notifier
                    .warn(&format!("virtual display unavailable: '{e}'")),
            }
        }

        let (width, height) = self.config.screen_size.dimensions();
        let mut video = VideoCapture::new(VideoConfig::new(width, height), &self.config.video_dir);
        video.start(self.driver.clone())?;
        self.video = Some(video);
        Ok(())
    }

    /// Per-scenario teardown, in fixed order.
    ///
    /// Best-effort steps warn; the console-error check is collected and
    /// returned after the remaining steps have run. With no report every
    /// step is a no-op.
    pub async fn after_scenario(&mut self, report: Option<&TestReport>) -> NavegarResult<()> {
        let budget = self.config.after_hook_timeout();
        let ms = self.config.after_hook_timeout_ms;
        match tokio::time::timeout(budget, self.run_after_scenario(report)).await {
            Ok(result) => result,
            Err(_) => Err(NavegarError::Timeout { ms }),
        }
    }

    async fn run_after_scenario(&mut self, report: Option<&TestReport>) -> NavegarResult<()> {
        let Some(report) = report else {
            return Ok(());
        };
        let failed = report.outcome.is_failed();

        // 1. Lab breakpoint, debug runs only.
        if failed && self.config.lab && self.config.lab_debug {
            if let Err(e) = self.driver.execute_script(LAB_BREAKPOINT_SCRIPT).await {
                self.notifier.warn(&format!("lab breakpoint failed: '{e}'"));
            }
        }

        // 2./3. Screenshot policy, best effort throughout.
        self.capture_screenshot(report).await;

        // 4. Failed scenarios can leave beforeunload alerts behind.
        if failed && (self.config.close_browser_on_complete || self.config.headless) {
            if let Err(e) = self.driver.dismiss_alerts().await {
                self.notifier.warn(&format!("alert dismissal failed: '{e}'"));
            }
        }

        // 5. Console check fails the scenario, but only after the steps
        // below have run.
        let console_result = check_console_errors(self.driver.as_ref()).await;

        // 6. Aggregate job status.
        self.all_passed = self.all_passed && !failed;

        // 7. Keep video only for failures.
        if failed {
            if let Some(video) = self.video.as_mut() {
                if let Err(e) = video.stop(Some(&report.title)).await {
                    self.notifier.warn(&format!("video finalize failed: '{e}'"));
                }
            }
        }

        console_result
    }

    async fn capture_screenshot(&self, report: &TestReport) {
        let failed = report.outcome.is_failed();
        if failed && self.config.never_save_screenshots {
            return;
        }
        if !failed && !self.config.save_all_screenshots {
            return;
        }

        let url = match self.driver.current_url().await {
            Ok(url) => {
                if failed {
                    info!(url = %url, "FAILED: taking screenshot");
                }
                Some(url)
            }
            Err(e) => {
                self.notifier.warn(&format!(
                    "could not capture the URL when taking a screenshot: '{e}'"
                ));
                None
            }
        };

        let timestamp = chrono::Utc::now().timestamp_millis();
        let locale = self.config.locale_label();
        let screen = self.config.screen_size.label();
        let name = if failed {
            failed_screenshot_name(&locale, screen, &report.title, timestamp)
        } else {
            passed_screenshot_name(&locale, screen, &report.suite, &report.title, timestamp)
        };

        match self.driver.take_screenshot().await {
            Ok(shot) => {
                if let Err(e) = self
                    .screenshots
                    .write(&shot.data, || name, &ScreenshotContext { url })
                {
                    self.notifier
                        .warn(&format!("could not save screenshot: '{e}'"));
                }
            }
            Err(e) => self
                .notifier
                .warn(&format!("could not take screenshot due to error: '{e}'")),
        }
    }

    /// Batch teardown, in fixed order: lab status, browser, video, display.
    ///
    /// Every step tolerates the previous one failing; reporting failures
    /// are logged and never alter recorded outcomes. Idempotent.
    pub async fn finish_batch(&mut self) -> NavegarResult<()> {
        let budget = self.config.after_hook_timeout();
        let ms = self.config.after_hook_timeout_ms;
        match tokio::time::timeout(budget, self.run_finish_batch()).await {
            Ok(result) => result,
            Err(_) => Err(NavegarError::Timeout { ms }),
        }
    }

    async fn run_finish_batch(&mut self) -> NavegarResult<()> {
        if self.config.lab {
            let script = lab_job_result_script(self.all_passed);
            if let Err(e) = self.driver.execute_script(&script).await {
                self.notifier
                    .warn(&format!("could not push lab job status: '{e}'"));
            }
        }

        if self.config.lab || self.config.close_browser_on_complete || self.config.headless {
            if let Err(e) = self.driver.quit().await {
                self.notifier.warn(&format!("browser quit failed: '{e}'"));
            }
        }

        if let Some(mut video) = self.video.take() {
            if let Err(e) = video.stop(None).await {
                self.notifier.warn(&format!("video stop failed: '{e}'"));
            }
        }

        if let Some(display) = self.display.take() {
            if let Err(e) = display.stop().await {
                self.notifier.warn(&format!("display stop failed: '{e}'"));
            }
        }
        Ok(())
    }
}
