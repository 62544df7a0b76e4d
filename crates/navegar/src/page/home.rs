//! Post-login home stream.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The stream page users land on after logging in
#[derive(Debug)]
pub struct HomePage {
    base: PageBase,
}

impl HomePage {
    fn defining() -> Selector {
        Selector::css("main.home__stream")
    }

    /// Expect the home stream on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "HomePage", wait).await?;
        Ok(Self { base })
    }

    /// Wait until the stream has rendered at least one card
    pub async fn wait_for_content(&self) -> NavegarResult<()> {
        self.base
            .wait_for(&Selector::css("main.home__stream article"))
            .await
    }
}
