//! Real browser session over the Chrome DevTools Protocol.
//!
//! [`CdpDriver`] implements [`BrowserDriver`] with chromiumoxide. One
//! session drives one page; console output is collected through a CDP
//! event listener and drained by [`BrowserDriver::console_logs`].

use crate::config::SuiteConfig;
use crate::driver::{BrowserDriver, ConsoleEntry, ConsoleLevel, ElementHandle, Screenshot};
use crate::locator::Selector;
use crate::result::{NavegarError, NavegarResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{ConsoleApiCalledType, EventConsoleApiCalled};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Launch configuration for the CDP session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub width: u32,
    /// Viewport height
    pub height: u32,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable inside containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1440,
            height: 1000,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Derive the launch configuration from the suite configuration
    #[must_use]
    pub fn from_suite(config: &SuiteConfig) -> Self {
        let (width, height) = config.screen_size.dimensions();
        Self {
            headless: config.headless,
            width,
            height,
            ..Default::default()
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable the sandbox (containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

fn console_level(kind: &ConsoleApiCalledType) -> ConsoleLevel {
    match kind {
        ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => ConsoleLevel::Error,
        ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
        ConsoleApiCalledType::Debug | ConsoleApiCalledType::Trace => ConsoleLevel::Debug,
        _ => ConsoleLevel::Info,
    }
}

fn console_text(event: &EventConsoleApiCalled) -> String {
    event
        .args
        .iter()
        .filter_map(|arg| {
            arg.description
                .clone()
                .or_else(|| arg.value.as_ref().map(ToString::to_string))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// CDP-backed browser session
pub struct CdpDriver {
    config: BrowserConfig,
    browser: Arc<Mutex<CdpBrowser>>,
    page: Arc<Mutex<CdpPage>>,
    console: Arc<StdMutex<Vec<ConsoleEntry>>>,
    handler_task: tokio::task::JoinHandle<()>,
    console_task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("config", &self.config)
            .finish()
    }
}

impl CdpDriver {
    /// Launch a browser and open a blank page
    pub async fn launch(config: BrowserConfig) -> NavegarResult<Self> {
        let mut builder = CdpConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        builder = builder.window_size(config.width, config.height);

        let cdp_config = builder
            .build()
            .map_err(|e| NavegarError::driver(format!("browser config rejected: {e}")))?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| NavegarError::driver(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| NavegarError::driver(format!("failed to open page: {e}")))?;

        let console = Arc::new(StdMutex::new(Vec::new()));
        let mut events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| NavegarError::driver(format!("console listener failed: {e}")))?;
        let console_buffer = Arc::clone(&console);
        let console_task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let entry = ConsoleEntry::new(console_level(&event.r#type), console_text(&event));
                if let Ok(mut buffer) = console_buffer.lock() {
                    buffer.push(entry);
                }
            }
        });

        debug!(headless = config.headless, "browser session launched");
        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
            page: Arc::new(Mutex::new(page)),
            console,
            handler_task,
            console_task,
        })
    }

    /// Launch configuration this session was built with
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> NavegarResult<()> {
        let page = self.page.lock().await;
        page.goto(url)
            .await
            .map_err(|e| NavegarError::driver(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> NavegarResult<Option<ElementHandle>> {
        let css = selector.to_css();
        let page = self.page.lock().await;
        match page.find_element(&css).await {
            Ok(_) => Ok(Some(ElementHandle::new(css))),
            Err(e) => {
                // CDP reports absence as a query failure.
                trace!(selector = %css, error = %e, "element not found");
                Ok(None)
            }
        }
    }

    async fn click(&self, selector: &Selector) -> NavegarResult<()> {
        let css = selector.to_css();
        let page = self.page.lock().await;
        let element = page
            .find_element(&css)
            .await
            .map_err(|e| NavegarError::driver(format!("cannot click '{css}': {e}")))?;
        element
            .click()
            .await
            .map_err(|e| NavegarError::driver(format!("click on '{css}' failed: {e}")))?;
        Ok(())
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> NavegarResult<()> {
        let css = selector.to_css();
        let page = self.page.lock().await;
        let element = page
            .find_element(&css)
            .await
            .map_err(|e| NavegarError::driver(format!("cannot type into '{css}': {e}")))?;
        element
            .click()
            .await
            .map_err(|e| NavegarError::driver(format!("focus on '{css}' failed: {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| NavegarError::driver(format!("typing into '{css}' failed: {e}")))?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> NavegarResult<serde_json::Value> {
        let page = self.page.lock().await;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| NavegarError::driver(format!("script evaluation failed: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn current_url(&self) -> NavegarResult<String> {
        let page = self.page.lock().await;
        let url = page
            .url()
            .await
            .map_err(|e| NavegarError::driver(format!("could not read URL: {e}")))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn take_screenshot(&self) -> NavegarResult<Screenshot> {
        let page = self.page.lock().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let response = page.execute(params).await.map_err(|e| {
            NavegarError::Screenshot {
                message: e.to_string(),
            }
        })?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&response.data)
            .map_err(|e| NavegarError::Screenshot {
                message: format!("base64 decode failed: {e}"),
            })?;
        Ok(Screenshot::new(data, self.config.width, self.config.height))
    }

    async fn console_logs(&self) -> NavegarResult<Vec<ConsoleEntry>> {
        Ok(self
            .console
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default())
    }

    async fn dismiss_alerts(&self) -> NavegarResult<()> {
        let params = HandleJavaScriptDialogParams::builder()
            .accept(true)
            .build()
            .map_err(NavegarError::driver)?;
        let page = self.page.lock().await;
        // Fails when no dialog is open, which is the common case.
        if let Err(e) = page.execute(params).await {
            trace!(error = %e, "no dialog to dismiss");
        }
        Ok(())
    }

    async fn quit(&self) -> NavegarResult<()> {
        {
            let mut browser = self.browser.lock().await;
            browser
                .close()
                .await
                .map_err(|e| NavegarError::driver(format!("browser close failed: {e}")))?;
        }
        self.console_task.abort();
        self.handler_task.abort();
        debug!("browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_suite_tracks_viewport() {
        let suite = SuiteConfig {
            headless: true,
            screen_size: crate::config::ScreenSize::Mobile,
            ..Default::default()
        };
        let config = BrowserConfig::from_suite(&suite);
        assert!(config.headless);
        assert_eq!((config.width, config.height), (400, 1000));
    }

    #[test]
    fn test_config_builders() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox();
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_console_level_mapping() {
        assert_eq!(
            console_level(&ConsoleApiCalledType::Error),
            ConsoleLevel::Error
        );
        assert_eq!(
            console_level(&ConsoleApiCalledType::Warning),
            ConsoleLevel::Warning
        );
        assert_eq!(console_level(&ConsoleApiCalledType::Log), ConsoleLevel::Info);
    }
}
