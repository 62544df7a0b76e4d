//! Login page.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;
use tracing::debug;

/// The standalone login form
#[derive(Debug)]
pub struct LoginPage {
    base: PageBase,
}

impl LoginPage {
    fn defining() -> Selector {
        Selector::css("form.login__form")
    }

    /// Expect the login form on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "LoginPage", wait).await?;
        Ok(Self { base })
    }

    /// Navigate to `url` and expect the login form there
    pub async fn visit(
        driver: Arc<dyn BrowserDriver>,
        url: &str,
        wait: WaitOptions,
    ) -> NavegarResult<Self> {
        let base = PageBase::visit(driver, url, Self::defining(), "LoginPage", wait).await?;
        Ok(Self { base })
    }

    /// Fill the form and submit
    pub async fn login(&self, username: &str, password: &str) -> NavegarResult<()> {
        debug!(username, "submitting login form");
        self.base
            .set_text(&Selector::css("input#username-or-email"), username)
            .await?;
        self.base
            .set_text(&Selector::css("input#password"), password)
            .await?;
        self.base
            .click(&Selector::css("form.login__form button[type='submit']"))
            .await
    }
}
