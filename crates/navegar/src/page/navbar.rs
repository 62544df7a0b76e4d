//! Top navigation bar component.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The persistent header bar (new-post button, my-sites link)
#[derive(Debug)]
pub struct NavBarComponent {
    base: PageBase,
}

impl NavBarComponent {
    fn defining() -> Selector {
        Selector::css("header.navbar")
    }

    /// Expect the nav bar on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "NavBarComponent", wait).await?;
        Ok(Self { base })
    }

    /// Open the editor via the write button.
    ///
    /// The write link resolves the user's primary site; when a specific
    /// `site` is wanted it gets pinned onto the link before following it.
    pub async fn click_new_post(&self, site: Option<&str>) -> NavegarResult<()> {
        if let Some(site) = site {
            let script = format!(
                "document.querySelector('a.navbar__new-post').search = '?site={site}'"
            );
            self.base.driver().execute_script(&script).await?;
        }
        self.base.click(&Selector::css("a.navbar__new-post")).await
    }

    /// Go to the my-sites view
    pub async fn click_my_sites(&self) -> NavegarResult<()> {
        self.base.click(&Selector::css("a.navbar__my-sites")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    #[tokio::test]
    async fn test_click_new_post_pins_site() {
        let mock = Arc::new(MockDriver::new());
        mock.add_elements(["header.navbar", "a.navbar__new-post"]);
        let driver: Arc<dyn BrowserDriver> = mock.clone();
        let navbar = NavBarComponent::expect(driver, WaitOptions::new(200).with_poll_interval(10))
            .await
            .unwrap();
        navbar.click_new_post(Some("ci-fixture-site")).await.unwrap();

        assert_eq!(mock.clicks(), vec!["a.navbar__new-post".to_string()]);
        let scripts = mock.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("?site=ci-fixture-site"));
    }

    #[tokio::test]
    async fn test_click_new_post_without_site_skips_script() {
        let mock = Arc::new(MockDriver::new());
        mock.add_elements(["header.navbar", "a.navbar__new-post"]);
        let driver: Arc<dyn BrowserDriver> = mock.clone();
        let navbar = NavBarComponent::expect(driver, WaitOptions::new(200).with_poll_interval(10))
            .await
            .unwrap();
        navbar.click_new_post(None).await.unwrap();
        assert!(mock.scripts().is_empty());
    }
}
