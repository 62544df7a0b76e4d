//! User journeys composed from page objects.
//!
//! A flow checks an account out of the pool at construction, drives the
//! shared browser session through a sequence of pages, and releases the
//! account exactly once when it ends. Site selection is decided by one
//! predicate, [`LoginFlow::resolved_site`]: an explicit override always
//! wins; otherwise self-hosted environments fall back to the configured
//! test site unless the account is a site-link account (those carry their
//! own site).

use crate::account::{Account, AccountKind, AccountPool, AccountSelector};
use crate::config::SuiteConfig;
use crate::driver::BrowserDriver;
use crate::page::{
    EditorPage, HomePage, LoginPage, NavBarComponent, SidebarComponent, StatsPage,
};
use crate::result::NavegarResult;
use crate::wait::WaitOptions;
use std::sync::Arc;
use tracing::{debug, info};

/// Login-centred journeys
pub struct LoginFlow {
    driver: Arc<dyn BrowserDriver>,
    pool: Arc<AccountPool>,
    config: SuiteConfig,
    account: Account,
    released: bool,
}

impl std::fmt::Debug for LoginFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("account", &self.account.key)
            .field("released", &self.released)
            .finish()
    }
}

impl LoginFlow {
    /// Build a flow, checking an account out of the pool.
    ///
    /// Without a selector the configuration's environment decides: the
    /// hosted default user, or the linked user for the self-hosted
    /// environment. Resolution failure is a configuration error.
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        pool: Arc<AccountPool>,
        config: SuiteConfig,
        selector: Option<AccountSelector>,
    ) -> NavegarResult<Self> {
        let selector = selector.unwrap_or_else(|| config.default_account_selector());
        let account = pool.acquire(&selector)?;
        info!(account = ?account.key, "flow account checked out");
        Ok(Self {
            driver,
            pool,
            config,
            account,
            released: false,
        })
    }

    /// The checked-out account
    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    fn wait(&self) -> WaitOptions {
        self.config.step_wait()
    }

    /// Site the journey should end up on.
    ///
    /// Pure in (environment kind, account kind, explicit override);
    /// evaluated once per journey invocation.
    #[must_use]
    pub fn resolved_site(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(site) = explicit {
            return Some(site.to_string());
        }
        if self.config.env.is_self_hosted() && self.account.kind != AccountKind::SiteLink {
            return self.config.test_site.clone();
        }
        None
    }

    async fn ensure_not_logged_in(&self) -> NavegarResult<()> {
        self.driver.navigate(&self.config.logout_url()).await
    }

    /// Log in from a clean session
    pub async fn login(&self) -> NavegarResult<()> {
        self.ensure_not_logged_in().await?;
        let url = self
            .account
            .login_url
            .clone()
            .unwrap_or_else(|| self.config.login_url());
        let page = LoginPage::visit(self.driver.clone(), &url, self.wait()).await?;
        page.login(self.account.login_name(), &self.account.password)
            .await
    }

    /// Submit credentials into a login form already on screen
    pub async fn login_using_existing_form(&self) -> NavegarResult<()> {
        let page = LoginPage::expect(self.driver.clone(), self.wait()).await?;
        page.login(self.account.login_name(), &self.account.password)
            .await
    }

    /// Log in and land on a site's stats via the my-sites view
    pub async fn login_and_select_my_site(&self, site: Option<&str>) -> NavegarResult<StatsPage> {
        let target = self.resolved_site(site);
        self.login().await?;

        let home = HomePage::expect(self.driver.clone(), self.wait()).await?;
        home.wait_for_content().await?;

        let navbar = NavBarComponent::expect(self.driver.clone(), self.wait()).await?;
        navbar.click_my_sites().await?;

        if let Some(site) = target {
            debug!(site, "switching to target site");
            let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
            sidebar.select_site_switcher().await?;
            sidebar.search_for_site(&site).await?;
        }

        StatsPage::expect(self.driver.clone(), self.wait()).await
    }

    /// Log in and open the editor on a fresh post
    pub async fn login_and_start_new_post(&self, site: Option<&str>) -> NavegarResult<EditorPage> {
        let target = self.resolved_site(site);
        self.login().await?;

        let home = HomePage::expect(self.driver.clone(), self.wait()).await?;
        home.wait_for_content().await?;

        let navbar = NavBarComponent::expect(self.driver.clone(), self.wait()).await?;
        navbar.click_new_post(target.as_deref()).await?;

        EditorPage::expect(self.driver.clone(), self.wait()).await
    }

    /// Log in and open the editor on a fresh page
    pub async fn login_and_start_new_page(&self, site: Option<&str>) -> NavegarResult<EditorPage> {
        self.login_and_select_my_site(site).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_add_new_page().await?;
        EditorPage::expect(self.driver.clone(), self.wait()).await
    }

    /// Log in and open site settings
    pub async fn login_and_select_settings(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_settings().await
    }

    /// Log in and open the themes section
    pub async fn login_and_select_themes(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_themes().await
    }

    /// Log in and open the plugins section
    pub async fn login_and_select_plugins(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_plugins().await
    }

    /// Log in and open the people section
    pub async fn login_and_select_people(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_people().await
    }

    /// Log in and open the domains section
    pub async fn login_and_select_domains(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_domains().await
    }

    /// Log in and switch to the all-sites view
    pub async fn login_and_select_all_sites(&self) -> NavegarResult<()> {
        self.login_and_select_my_site(None).await?;
        let sidebar = SidebarComponent::expect(self.driver.clone(), self.wait()).await?;
        sidebar.select_site_switcher().await?;
        sidebar.select_all_sites().await
    }

    /// Release the account. Safe to call more than once.
    pub fn end(&mut self) {
        if !self.released {
            self.pool.release(&self.account);
            self.released = true;
        }
    }
}

impl Drop for LoginFlow {
    fn drop(&mut self) {
        // A dropped flow must not leave its account checked out.
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountRecord;
    use std::collections::HashMap;

    fn config_with_accounts(env: crate::config::EnvKind) -> SuiteConfig {
        let mut accounts = HashMap::new();
        accounts.insert(
            "defaultUser".to_string(),
            AccountRecord {
                username: "default".to_string(),
                email: None,
                password: "pw".to_string(),
                login_url: None,
                features: Default::default(),
                site_link: false,
            },
        );
        accounts.insert(
            "linkedUserCi".to_string(),
            AccountRecord {
                username: "linked".to_string(),
                email: None,
                password: "pw".to_string(),
                login_url: None,
                features: Default::default(),
                site_link: true,
            },
        );
        SuiteConfig {
            env,
            test_site: Some("ci-fixture-site".to_string()),
            explicit_wait_ms: 200,
            accounts,
            ..Default::default()
        }
    }

    fn flow(env: crate::config::EnvKind, selector: Option<AccountSelector>) -> LoginFlow {
        let config = config_with_accounts(env);
        let pool = Arc::new(AccountPool::new(config.accounts.clone()).without_markers());
        let driver: Arc<dyn BrowserDriver> = Arc::new(crate::mock::MockDriver::new());
        LoginFlow::new(driver, pool, config, selector).unwrap()
    }

    #[test]
    fn test_explicit_site_always_wins() {
        let flow = flow(crate::config::EnvKind::Ci, None);
        assert_eq!(
            flow.resolved_site(Some("override-site")),
            Some("override-site".to_string())
        );
    }

    #[test]
    fn test_self_hosted_falls_back_to_test_site() {
        let flow = flow(
            crate::config::EnvKind::Ci,
            Some(AccountSelector::by_key("defaultUser")),
        );
        assert_eq!(
            flow.resolved_site(None),
            Some("ci-fixture-site".to_string())
        );
    }

    #[test]
    fn test_site_link_account_gets_no_fallback() {
        // Default selector on CI picks the linked user, which brings its
        // own site.
        let flow = flow(crate::config::EnvKind::Ci, None);
        assert_eq!(flow.account().kind, AccountKind::SiteLink);
        assert_eq!(flow.resolved_site(None), None);
    }

    #[test]
    fn test_hosted_env_gets_no_fallback() {
        let flow = flow(crate::config::EnvKind::Hosted, None);
        assert_eq!(flow.resolved_site(None), None);
    }

    #[test]
    fn test_unknown_account_is_configuration_error() {
        let config = config_with_accounts(crate::config::EnvKind::Hosted);
        let pool = Arc::new(AccountPool::new(config.accounts.clone()).without_markers());
        let driver: Arc<dyn BrowserDriver> = Arc::new(crate::mock::MockDriver::new());
        let err = LoginFlow::new(
            driver,
            pool,
            config,
            Some(AccountSelector::by_key("ghostUser")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::result::NavegarError::Configuration { .. }
        ));
    }

    #[test]
    fn test_end_releases_once_and_drop_is_safe() {
        let config = config_with_accounts(crate::config::EnvKind::Hosted);
        let pool = Arc::new(AccountPool::new(config.accounts.clone()).without_markers());
        let driver: Arc<dyn BrowserDriver> = Arc::new(crate::mock::MockDriver::new());
        let mut flow = LoginFlow::new(driver, pool.clone(), config, None).unwrap();
        assert!(pool.is_in_use("defaultUser"));
        flow.end();
        assert!(!pool.is_in_use("defaultUser"));
        flow.end();
        drop(flow);
        assert_eq!(pool.in_use_count(), 0);
    }
}
