//! Site stats page.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The stats overview a selected site lands on
#[derive(Debug)]
pub struct StatsPage {
    base: PageBase,
}

impl StatsPage {
    fn defining() -> Selector {
        Selector::css("main.stats")
    }

    /// Expect the stats overview on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "StatsPage", wait).await?;
        Ok(Self { base })
    }

    /// Switch to the insights tab
    pub async fn open_insights(&self) -> NavegarResult<()> {
        self.base
            .click(&Selector::css("a[href*='/stats/insights/']"))
            .await
    }
}
