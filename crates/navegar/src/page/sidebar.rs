//! Site sidebar component.

use super::PageBase;
use crate::driver::BrowserDriver;
use crate::locator::Selector;
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;

/// The my-sites sidebar (section links, site switcher)
#[derive(Debug)]
pub struct SidebarComponent {
    base: PageBase,
}

impl SidebarComponent {
    fn defining() -> Selector {
        Selector::css(".sidebar")
    }

    /// Expect the sidebar on the current page
    pub async fn expect(driver: Arc<dyn BrowserDriver>, wait: WaitOptions) -> NavegarResult<Self> {
        let base = PageBase::expect(driver, Self::defining(), "SidebarComponent", wait).await?;
        Ok(Self { base })
    }

    async fn select(&self, href_part: &str) -> NavegarResult<()> {
        self.base
            .click(&Selector::css(format!(".sidebar a[href*='{href_part}']")))
            .await
    }

    /// Open the new-page editor
    pub async fn select_add_new_page(&self) -> NavegarResult<()> {
        self.base.click(&Selector::css(".sidebar__add-new-page")).await
    }

    /// Open site settings
    pub async fn select_settings(&self) -> NavegarResult<()> {
        self.select("/settings/").await
    }

    /// Open the themes section
    pub async fn select_themes(&self) -> NavegarResult<()> {
        self.select("/themes/").await
    }

    /// Open the plugins section
    pub async fn select_plugins(&self) -> NavegarResult<()> {
        self.select("/plugins/").await
    }

    /// Open the people section
    pub async fn select_people(&self) -> NavegarResult<()> {
        self.select("/people/").await
    }

    /// Open the domains section
    pub async fn select_domains(&self) -> NavegarResult<()> {
        self.select("/domains/").await
    }

    /// Open the site switcher
    pub async fn select_site_switcher(&self) -> NavegarResult<()> {
        self.base.click(&Selector::css(".sidebar__switch-site")).await
    }

    /// Search the open switcher and pick the first matching site
    pub async fn search_for_site(&self, site: &str) -> NavegarResult<()> {
        self.base
            .set_text(&Selector::css(".site-selector input[type='search']"), site)
            .await?;
        self.base
            .click(&Selector::css(".site-selector .site__content"))
            .await
    }

    /// Pick "All sites" in the open switcher
    pub async fn select_all_sites(&self) -> NavegarResult<()> {
        self.base.click(&Selector::css(".site-selector .all-sites a")).await
    }
}
