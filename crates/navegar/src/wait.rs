//! Bounded wait helpers over a [`BrowserDriver`].
//!
//! Every helper polls until its condition holds or the explicit timeout
//! elapses; nothing here blocks indefinitely. Timeouts surface as
//! [`NavegarError::Timeout`], which page construction upgrades to
//! [`NavegarError::PageNotReady`].

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Selector;
use crate::result::{NavegarError, NavegarResult};
use std::time::{Duration, Instant};

/// Default bounded wait (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Options for bounded waits
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create options with the given timeout
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            ..Default::default()
        }
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Same options with the timeout multiplied (disappearance waits run 3x)
    #[must_use]
    pub const fn times(mut self, factor: u64) -> Self {
        self.timeout_ms *= factor;
        self
    }

    /// Timeout as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Wait until the selector matches a displayed element
pub async fn wait_till_present(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    opts: &WaitOptions,
) -> NavegarResult<ElementHandle> {
    let start = Instant::now();
    loop {
        if let Some(handle) = driver.find_element(selector).await? {
            if handle.displayed {
                return Ok(handle);
            }
        }
        if start.elapsed() >= opts.timeout() {
            return Err(NavegarError::Timeout {
                ms: opts.timeout_ms,
            });
        }
        tokio::time::sleep(opts.poll_interval()).await;
    }
}

/// Wait until the selector no longer matches any element
pub async fn wait_till_not_present(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    opts: &WaitOptions,
) -> NavegarResult<()> {
    let start = Instant::now();
    loop {
        if driver.find_element(selector).await?.is_none() {
            return Ok(());
        }
        if start.elapsed() >= opts.timeout() {
            return Err(NavegarError::Timeout {
                ms: opts.timeout_ms,
            });
        }
        tokio::time::sleep(opts.poll_interval()).await;
    }
}

/// Wait for the element, then click it
pub async fn click_when_clickable(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    opts: &WaitOptions,
) -> NavegarResult<()> {
    wait_till_present(driver, selector, opts).await?;
    driver.click(selector).await
}

/// Wait for the element, then type into it
pub async fn set_when_settable(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    text: &str,
    opts: &WaitOptions,
) -> NavegarResult<()> {
    wait_till_present(driver, selector, opts).await?;
    driver.type_text(selector, text).await
}

/// Wait for a checkbox and ensure it ends up checked.
///
/// Already-checked boxes are left alone so the helper is safe to call on
/// forms that remember state.
pub async fn set_checkbox(
    driver: &dyn BrowserDriver,
    selector: &Selector,
    opts: &WaitOptions,
) -> NavegarResult<()> {
    wait_till_present(driver, selector, opts).await?;
    let query = selector.to_query();
    let checked = driver
        .execute_script(&format!("!!({query} && {query}.checked)"))
        .await?;
    if checked.as_bool() == Some(true) {
        return Ok(());
    }
    driver.click(selector).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    fn fast() -> WaitOptions {
        WaitOptions::new(200).with_poll_interval(10)
    }

    #[tokio::test]
    async fn test_wait_till_present_immediate() {
        let driver = MockDriver::new();
        driver.add_elements(["button.go"]);
        let handle = wait_till_present(&driver, &Selector::css("button.go"), &fast())
            .await
            .unwrap();
        assert!(handle.displayed);
    }

    #[tokio::test]
    async fn test_wait_till_present_times_out() {
        let driver = MockDriver::new();
        let err = wait_till_present(&driver, &Selector::css("button.missing"), &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, NavegarError::Timeout { ms: 200 }));
    }

    #[tokio::test]
    async fn test_wait_till_not_present() {
        let driver = MockDriver::new();
        driver.add_elements(["div.spinner"]);
        driver.remove_elements(["div.spinner"]);
        wait_till_not_present(&driver, &Selector::css("div.spinner"), &fast())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_click_when_clickable_records_click() {
        let driver = MockDriver::new();
        driver.add_elements(["a.link"]);
        click_when_clickable(&driver, &Selector::css("a.link"), &fast())
            .await
            .unwrap();
        assert_eq!(driver.clicks(), vec!["a.link".to_string()]);
    }

    #[tokio::test]
    async fn test_set_when_settable_types() {
        let driver = MockDriver::new();
        driver.add_elements(["input#username"]);
        set_when_settable(&driver, &Selector::css("input#username"), "alice", &fast())
            .await
            .unwrap();
        assert_eq!(
            driver.typed(),
            vec![("input#username".to_string(), "alice".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_checkbox_clicks_unchecked_box() {
        let driver = MockDriver::new();
        driver.add_elements(["input.confirm"]);
        set_checkbox(&driver, &Selector::css("input.confirm"), &fast())
            .await
            .unwrap();
        assert_eq!(driver.clicks(), vec!["input.confirm".to_string()]);
    }

    #[test]
    fn test_times_scales_timeout_only() {
        let opts = WaitOptions::new(10_000).times(3);
        assert_eq!(opts.timeout_ms, 30_000);
        assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
