//! Abstract browser automation boundary.
//!
//! Everything above this trait (pages, flows, hooks) is driver-agnostic.
//! The CDP implementation lives in [`crate::browser`]; a scripted in-memory
//! implementation for tests lives in [`crate::mock`]. Sessions are injected
//! explicitly (`Arc<dyn BrowserDriver>`) rather than held in an ambient
//! global.

use crate::locator::Selector;
use crate::result::NavegarResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Element handle returned by a find operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific identifier
    pub id: String,
    /// Element tag name, when the driver reports it
    pub tag_name: Option<String>,
    /// Text content, when the driver reports it
    pub text: Option<String>,
    /// Whether the element is rendered and visible
    pub displayed: bool,
}

impl ElementHandle {
    /// Create a visible handle for the given identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: None,
            text: None,
            displayed: true,
        }
    }
}

/// Screenshot data with capture metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// When the capture was taken
    pub taken_at: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            taken_at: std::time::SystemTime::now(),
        }
    }

    /// Size of the encoded data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Severity of a console entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsoleLevel {
    /// Verbose/debug output
    Debug,
    /// Informational output
    Info,
    /// Warning output
    Warning,
    /// Error output
    Error,
}

impl ConsoleLevel {
    /// Whether entries at this level fail the console check
    #[must_use]
    pub const fn is_severe(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// A single browser console entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// Entry severity
    pub level: ConsoleLevel,
    /// Entry text
    pub text: String,
}

impl ConsoleEntry {
    /// Create a console entry
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Browser automation operations the harness depends on.
///
/// Implementations drive one sequential session; no call overlaps another
/// within a scenario. `find_element` reports absence as `Ok(None)`, never as
/// an error, so bounded waits can poll it.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn navigate(&self, url: &str) -> NavegarResult<()>;

    /// Find an element; absence is `Ok(None)`
    async fn find_element(&self, selector: &Selector) -> NavegarResult<Option<ElementHandle>>;

    /// Click the first element matching the selector
    async fn click(&self, selector: &Selector) -> NavegarResult<()>;

    /// Type text into the first element matching the selector
    async fn type_text(&self, selector: &Selector, text: &str) -> NavegarResult<()>;

    /// Evaluate a script in the page, returning its JSON value
    async fn execute_script(&self, script: &str) -> NavegarResult<serde_json::Value>;

    /// Current page URL
    async fn current_url(&self) -> NavegarResult<String>;

    /// Capture a screenshot of the viewport
    async fn take_screenshot(&self) -> NavegarResult<Screenshot>;

    /// Drain buffered console entries collected since the last call
    async fn console_logs(&self) -> NavegarResult<Vec<ConsoleEntry>>;

    /// Dismiss any open alert/confirm dialogs; no-op when none are open
    async fn dismiss_alerts(&self) -> NavegarResult<()>;

    /// End the browser session
    async fn quit(&self) -> NavegarResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_handle_defaults_displayed() {
        let handle = ElementHandle::new("node-7");
        assert!(handle.displayed);
        assert_eq!(handle.id, "node-7");
    }

    #[test]
    fn test_screenshot_size() {
        let shot = Screenshot::new(vec![1, 2, 3], 800, 600);
        assert_eq!(shot.size_bytes(), 3);
        assert_eq!(shot.width, 800);
    }

    #[test]
    fn test_only_errors_are_severe() {
        assert!(ConsoleLevel::Error.is_severe());
        assert!(!ConsoleLevel::Warning.is_severe());
        assert!(!ConsoleLevel::Info.is_severe());
        assert!(!ConsoleLevel::Debug.is_severe());
    }
}
