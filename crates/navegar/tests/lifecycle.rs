//! Batch lifecycle tests: screenshot policy, job status, teardown order
//! tolerance.

use navegar::mock::MockDriver;
use navegar::notifier::CollectingNotifier;
use navegar::{
    BatchHooks, BrowserDriver, ConsoleLevel, NavegarError, SuiteConfig, TestReport,
};
use std::path::Path;
use std::sync::Arc;

fn artifact_config(dir: &Path) -> SuiteConfig {
    SuiteConfig {
        headless: true,
        screenshot_dir: dir.join("screenshots"),
        video_dir: dir.join("videos"),
        ..Default::default()
    }
}

fn png_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn failing_scenario_writes_failed_screenshot() {
    navegar::tracing_support::init();
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let mut hooks = BatchHooks::new(artifact_config(dir.path()), driver);

    hooks
        .after_scenario(Some(&TestReport::failed(
            "Login suite",
            "Logs in successfully",
        )))
        .await
        .unwrap();

    let files = png_files(&dir.path().join("screenshots"));
    assert_eq!(files.len(), 1);
    let pattern = regex::Regex::new(r"^FAILED-EN-DESKTOP-logs-in-successfully-\d+\.png$").unwrap();
    assert!(
        pattern.is_match(&files[0]),
        "unexpected filename: {}",
        files[0]
    );
    assert_eq!(mock.screenshot_count(), 1);
}

#[tokio::test]
async fn never_save_suppresses_failure_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        never_save_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);

    hooks
        .after_scenario(Some(&TestReport::failed("Suite", "Broken test")))
        .await
        .unwrap();

    assert_eq!(mock.screenshot_count(), 0);
    assert!(png_files(&dir.path().join("screenshots")).is_empty());
}

#[tokio::test]
async fn save_all_writes_exactly_one_capture_for_passing_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        save_all_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);

    hooks
        .after_scenario(Some(&TestReport::passed("Login suite", "Shows the stream")))
        .await
        .unwrap();

    let files = png_files(&dir.path().join("screenshots"));
    assert_eq!(files.len(), 1);
    let pattern =
        regex::Regex::new(r"^EN-DESKTOP-login-suite-\d+-shows-the-stream\.png$").unwrap();
    assert!(
        pattern.is_match(&files[0]),
        "unexpected filename: {}",
        files[0]
    );
}

#[tokio::test]
async fn passing_scenario_without_save_all_captures_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let mut hooks = BatchHooks::new(artifact_config(dir.path()), driver);

    hooks
        .after_scenario(Some(&TestReport::passed("Suite", "Quiet pass")))
        .await
        .unwrap();

    assert_eq!(mock.screenshot_count(), 0);
}

#[tokio::test]
async fn screenshot_failure_warns_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    mock.fail_screenshots(true);
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let notifier = Arc::new(CollectingNotifier::new());
    let mut hooks =
        BatchHooks::new(artifact_config(dir.path()), driver).with_notifier(notifier.clone());

    hooks
        .after_scenario(Some(&TestReport::failed("Suite", "Flaky")))
        .await
        .unwrap();

    let warnings = notifier.messages();
    assert!(warnings
        .iter()
        .any(|w| w.contains("could not take screenshot")));
}

#[tokio::test]
async fn console_errors_fail_the_scenario_after_other_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    mock.push_console(ConsoleLevel::Error, "Uncaught ReferenceError");
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        never_save_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);
    hooks.start_batch().await.unwrap();

    let err = hooks
        .after_scenario(Some(&TestReport::failed("Suite", "Crashy")))
        .await
        .unwrap_err();
    assert!(matches!(err, NavegarError::ConsoleErrors { count: 1, .. }));

    // The steps after the console check still ran: the aggregate flipped
    // and the failure video was finalized (discarded here, no frames).
    assert!(!hooks.all_passed());
    assert!(!hooks.video_recording());
}

#[tokio::test]
async fn failed_scenario_dismisses_alerts_when_headless() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        never_save_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);

    hooks
        .after_scenario(Some(&TestReport::failed("Suite", "Leaves a prompt")))
        .await
        .unwrap();
    assert_eq!(mock.alerts_dismissed(), 1);

    hooks
        .after_scenario(Some(&TestReport::passed("Suite", "Clean pass")))
        .await
        .unwrap();
    assert_eq!(mock.alerts_dismissed(), 1);
}

#[tokio::test]
async fn lab_debug_injects_breakpoint_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        lab: true,
        lab_debug: true,
        never_save_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);

    hooks
        .after_scenario(Some(&TestReport::failed("Suite", "Debug me")))
        .await
        .unwrap();
    assert!(mock.scripts().contains(&"lab: break".to_string()));
}

#[tokio::test]
async fn finish_batch_pushes_lab_status_and_quits() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let config = SuiteConfig {
        lab: true,
        never_save_screenshots: true,
        ..artifact_config(dir.path())
    };
    let mut hooks = BatchHooks::new(config, driver);
    hooks.start_batch().await.unwrap();

    hooks
        .after_scenario(Some(&TestReport::failed("Suite", "One bad apple")))
        .await
        .unwrap();
    hooks.finish_batch().await.unwrap();

    assert!(mock
        .scripts()
        .contains(&"lab:job-result=false".to_string()));
    assert!(mock.quit_called());
    assert!(!hooks.video_recording());
}

#[tokio::test]
async fn zero_scenario_batch_tears_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let mut hooks = BatchHooks::new(artifact_config(dir.path()), driver);

    hooks.start_batch().await.unwrap();
    assert!(hooks.video_recording());

    hooks.after_scenario(None).await.unwrap();
    hooks.finish_batch().await.unwrap();

    assert!(!hooks.video_recording());
    assert!(hooks.all_passed());
    // Headless batch quits the browser on completion.
    assert!(mock.quit_called());
    // Nothing was captured for a batch with no scenarios.
    assert!(png_files(&dir.path().join("screenshots")).is_empty());
    assert!(png_files(&dir.path().join("videos")).is_empty());
}

#[tokio::test]
async fn start_batch_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mock = Arc::new(MockDriver::new());
    let driver: Arc<dyn BrowserDriver> = mock.clone();
    let mut hooks = BatchHooks::new(artifact_config(dir.path()), driver);
    hooks.start_batch().await.unwrap();
    hooks.start_batch().await.unwrap();
    hooks.finish_batch().await.unwrap();
}
