//! Purchase cancellation survey.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The confirm-cancellation survey shown before a purchase is dropped
#[derive(Debug)]
pub struct CancelPurchasePage {
    base: PageBase,
    confirm_button: Selector,
}

impl CancelPurchasePage {
    fn defining() -> Selector {
        Selector::css(".cancel-purchase.main")
    }

    /// Expect the cancellation survey on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "CancelPurchasePage", wait).await?;
        Ok(Self {
            base,
            confirm_button: Selector::css("button[type='submit']"),
        })
    }

    /// Answer the survey, tick the confirmation box and submit
    pub async fn complete_survey_and_confirm(&self) -> NavegarResult<()> {
        self.base
            .click(&Selector::css(".select-dropdown__header"))
            .await?;
        self.base
            .click(&Selector::css(".select-dropdown__item"))
            .await?;
        self.base
            .set_checkbox(&Selector::css(
                ".cancel-purchase__confirm input[type='checkbox']",
            ))
            .await?;
        self.base.click(&self.confirm_button).await
    }

    /// Wait for the survey to close after submission
    pub async fn wait_to_disappear(&self) -> NavegarResult<()> {
        crate::wait::wait_till_not_present(
            self.base.driver().as_ref(),
            &self.confirm_button,
            &self.base.wait().times(3),
        )
        .await
    }
}
