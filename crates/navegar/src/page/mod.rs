//! Page and component objects.
//!
//! Every page wraps a DOM region behind a defining selector and is only
//! handed to the caller once that selector is present: construction goes
//! through [`PageBase::expect`] (or `visit`, which navigates first) and
//! returns `Err(PageNotReady)` when the element never shows up inside the
//! bounded wait. Pages hold the injected driver handle and nothing else.

use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::{NavegarError, NavegarResult};
use crate::wait::{self, WaitOptions};
use std::sync::Arc;
use tracing::trace;

mod cancel_purchase;
mod editor;
mod home;
mod login;
mod navbar;
mod sidebar;
mod stats;

pub use cancel_purchase::CancelPurchasePage;
pub use editor::EditorPage;
pub use home::HomePage;
pub use login::LoginPage;
pub use navbar::NavBarComponent;
pub use sidebar::SidebarComponent;
pub use stats::StatsPage;

/// Shared state and helpers behind every page object
pub struct PageBase {
    driver: Arc<dyn BrowserDriver>,
    defining: Selector,
    name: &'static str,
    wait: WaitOptions,
}

impl std::fmt::Debug for PageBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBase")
            .field("name", &self.name)
            .field("defining", &self.defining)
            .finish()
    }
}

impl PageBase {
    /// Construct once the defining element is present.
    ///
    /// A timeout on the defining element becomes
    /// [`NavegarError::PageNotReady`] carrying the page name.
    pub(crate) async fn expect(
        driver: Arc<dyn BrowserDriver>,
        defining: Selector,
        name: &'static str,
        wait: WaitOptions,
    ) -> NavegarResult<Self> {
        match wait::wait_till_present(driver.as_ref(), &defining, &wait).await {
            Ok(_) => {
                trace!(page = name, "page ready");
                Ok(Self {
                    driver,
                    defining,
                    name,
                    wait,
                })
            }
            Err(NavegarError::Timeout { ms }) => Err(NavegarError::PageNotReady {
                page: name.to_string(),
                selector: defining.to_css(),
                ms,
            }),
            Err(other) => Err(other),
        }
    }

    /// Navigate to `url`, then construct as [`Self::expect`]
    pub(crate) async fn visit(
        driver: Arc<dyn BrowserDriver>,
        url: &str,
        defining: Selector,
        name: &'static str,
        wait: WaitOptions,
    ) -> NavegarResult<Self> {
        driver.navigate(url).await?;
        Self::expect(driver, defining, name, wait).await
    }

    /// The injected driver handle
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Page object name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Bounded wait this page was built with
    #[must_use]
    pub const fn wait(&self) -> WaitOptions {
        self.wait
    }

    /// Wait until the defining element is gone (3x the page wait)
    pub async fn wait_to_disappear(&self) -> NavegarResult<()> {
        wait::wait_till_not_present(self.driver.as_ref(), &self.defining, &self.wait.times(3)).await
    }

    pub(crate) async fn click(&self, selector: &Selector) -> NavegarResult<()> {
        wait::click_when_clickable(self.driver.as_ref(), selector, &self.wait).await
    }

    pub(crate) async fn set_text(&self, selector: &Selector, text: &str) -> NavegarResult<()> {
        wait::set_when_settable(self.driver.as_ref(), selector, text, &self.wait).await
    }

    pub(crate) async fn set_checkbox(&self, selector: &Selector) -> NavegarResult<()> {
        wait::set_checkbox(self.driver.as_ref(), selector, &self.wait).await
    }

    pub(crate) async fn wait_for(&self, selector: &Selector) -> NavegarResult<()> {
        wait::wait_till_present(self.driver.as_ref(), selector, &self.wait).await?;
        Ok(())
    }
}
