//! Scripted in-memory driver for browser-free tests.
//!
//! The mock holds a flat set of "present" selectors plus two kinds of
//! scripted reactions: routes (navigation swaps the DOM) and click
//! transitions (a click reveals elements or moves to a new page state).
//! Every interaction is recorded so tests can assert on what the harness
//! actually did.

use crate::driver::{BrowserDriver, ConsoleEntry, ConsoleLevel, ElementHandle, Screenshot};
use crate::locator::Selector;
use crate::result::{NavegarError, NavegarResult};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Transition {
    replace: bool,
    present: BTreeSet<String>,
    url: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    url: String,
    present: BTreeSet<String>,
    routes: Vec<(String, BTreeSet<String>)>,
    transitions: HashMap<String, Transition>,
    console: Vec<ConsoleEntry>,
    navigations: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    scripts: Vec<String>,
    screenshots_taken: u32,
    alerts_dismissed: u32,
    quit_called: bool,
    screenshot_data: Vec<u8>,
    fail_screenshots: bool,
}

/// Scripted [`BrowserDriver`] implementation
#[derive(Debug, Default)]
pub struct MockDriver {
    inner: Mutex<Inner>,
}

impl MockDriver {
    /// Create an empty mock with a blank page
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        {
            let mut inner = driver.inner.lock().expect("mock state poisoned");
            inner.url = "about:blank".to_string();
            inner.screenshot_data = b"mock-png-bytes".to_vec();
        }
        driver
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock state poisoned")
    }

    /// Navigating to a URL containing `url_part` swaps the DOM to `selectors`
    pub fn route<I, S>(&self, url_part: &str, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().routes.push((
            url_part.to_string(),
            selectors.into_iter().map(Into::into).collect(),
        ));
    }

    /// Clicking `selector` replaces the DOM (page navigation)
    pub fn on_click_navigate<I, S>(&self, selector: &str, url: &str, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().transitions.insert(
            selector.to_string(),
            Transition {
                replace: true,
                present: selectors.into_iter().map(Into::into).collect(),
                url: Some(url.to_string()),
            },
        );
    }

    /// Clicking `selector` reveals extra elements in place
    pub fn on_click_reveal<I, S>(&self, selector: &str, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().transitions.insert(
            selector.to_string(),
            Transition {
                replace: false,
                present: selectors.into_iter().map(Into::into).collect(),
                url: None,
            },
        );
    }

    /// Add elements to the current DOM
    pub fn add_elements<I, S>(&self, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.lock();
        for selector in selectors {
            inner.present.insert(selector.into());
        }
    }

    /// Remove elements from the current DOM
    pub fn remove_elements<I, S>(&self, selectors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.lock();
        for selector in selectors {
            inner.present.remove(&selector.into());
        }
    }

    /// Queue a console entry for the next `console_logs` drain
    pub fn push_console(&self, level: ConsoleLevel, text: &str) {
        self.lock().console.push(ConsoleEntry::new(level, text));
    }

    /// Bytes returned by `take_screenshot`
    pub fn set_screenshot_data(&self, data: Vec<u8>) {
        self.lock().screenshot_data = data;
    }

    /// Make `take_screenshot` fail with a driver error
    pub fn fail_screenshots(&self, fail: bool) {
        self.lock().fail_screenshots = fail;
    }

    /// URLs navigated to, in order
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Selectors clicked, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    /// (selector, text) pairs typed, in order
    #[must_use]
    pub fn typed(&self) -> Vec<(String, String)> {
        self.lock().typed.clone()
    }

    /// Scripts executed, in order
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    /// Number of screenshots captured
    #[must_use]
    pub fn screenshot_count(&self) -> u32 {
        self.lock().screenshots_taken
    }

    /// Number of alert-dismissal calls
    #[must_use]
    pub fn alerts_dismissed(&self) -> u32 {
        self.lock().alerts_dismissed
    }

    /// Whether the session was quit
    #[must_use]
    pub fn quit_called(&self) -> bool {
        self.lock().quit_called
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> NavegarResult<()> {
        let mut inner = self.lock();
        inner.navigations.push(url.to_string());
        inner.url = url.to_string();
        let matched = inner
            .routes
            .iter()
            .find(|(part, _)| url.contains(part.as_str()))
            .map(|(_, dom)| dom.clone());
        inner.present = matched.unwrap_or_default();
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> NavegarResult<Option<ElementHandle>> {
        let css = selector.to_css();
        let inner = self.lock();
        Ok(inner
            .present
            .contains(&css)
            .then(|| ElementHandle::new(css)))
    }

    async fn click(&self, selector: &Selector) -> NavegarResult<()> {
        let css = selector.to_css();
        let mut inner = self.lock();
        if !inner.present.contains(&css) {
            return Err(NavegarError::driver(format!(
                "cannot click '{css}': element not present"
            )));
        }
        inner.clicks.push(css.clone());
        if let Some(transition) = inner.transitions.get(&css).cloned() {
            if transition.replace {
                inner.present = transition.present;
            } else {
                inner.present.extend(transition.present);
            }
            if let Some(url) = transition.url {
                inner.url = url;
            }
        }
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> NavegarResult<()> {
        let css = selector.to_css();
        let mut inner = self.lock();
        if !inner.present.contains(&css) {
            return Err(NavegarError::driver(format!(
                "cannot type into '{css}': element not present"
            )));
        }
        inner.typed.push((css, text.to_string()));
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> NavegarResult<serde_json::Value> {
        self.lock().scripts.push(script.to_string());
        Ok(serde_json::Value::Null)
    }

    async fn current_url(&self) -> NavegarResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn take_screenshot(&self) -> NavegarResult<Screenshot> {
        let mut inner = self.lock();
        if inner.fail_screenshots {
            return Err(NavegarError::Screenshot {
                message: "mock screenshot failure".to_string(),
            });
        }
        inner.screenshots_taken += 1;
        Ok(Screenshot::new(inner.screenshot_data.clone(), 1440, 1000))
    }

    async fn console_logs(&self) -> NavegarResult<Vec<ConsoleEntry>> {
        Ok(std::mem::take(&mut self.lock().console))
    }

    async fn dismiss_alerts(&self) -> NavegarResult<()> {
        self.lock().alerts_dismissed += 1;
        Ok(())
    }

    async fn quit(&self) -> NavegarResult<()> {
        self.lock().quit_called = true;
        Ok(())
    }
}
