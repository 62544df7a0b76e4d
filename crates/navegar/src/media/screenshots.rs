//! Screenshot persistence with deterministic filenames.
//!
//! Filenames carry locale, viewport and the sanitized test title so a CI
//! artifact listing reads without opening anything:
//! `FAILED-EN-DESKTOP-logs-in-successfully-1730000000000.png` for failures,
//! `EN-DESKTOP-<suite>-<ts>-<test>.png` when a run saves everything.

use crate::result::NavegarResult;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("static regex"))
}

/// Reduce a test title to lowercase alphanumeric-and-dash
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    non_alphanumeric()
        .replace_all(title, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// Filename for a failing scenario's capture
#[must_use]
pub fn failed_screenshot_name(locale: &str, screen: &str, title: &str, timestamp_ms: i64) -> String {
    format!(
        "FAILED-{locale}-{screen}-{}-{timestamp_ms}",
        sanitize_title(title)
    )
}

/// Filename for a passing scenario's capture (save-all runs)
#[must_use]
pub fn passed_screenshot_name(
    locale: &str,
    screen: &str,
    suite: &str,
    title: &str,
    timestamp_ms: i64,
) -> String {
    format!(
        "{locale}-{screen}-{}-{timestamp_ms}-{}",
        sanitize_title(suite),
        sanitize_title(title)
    )
}

/// Context recorded alongside a capture
#[derive(Debug, Clone, Default)]
pub struct ScreenshotContext {
    /// Page URL at capture time, when the driver could report it
    pub url: Option<String>,
}

/// Writes screenshot bytes under a configured directory
#[derive(Debug, Clone)]
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    /// Create a writer rooted at `dir` (created on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory captures land in
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a capture, deriving the filename from the factory
    pub fn write<F>(
        &self,
        data: &[u8],
        filename: F,
        context: &ScreenshotContext,
    ) -> NavegarResult<PathBuf>
    where
        F: FnOnce() -> String,
    {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.png", filename()));
        std::fs::write(&path, data)?;
        info!(
            path = %path.display(),
            url = context.url.as_deref().unwrap_or("<unknown>"),
            "screenshot saved"
        );
        Ok(path)
    }
}
